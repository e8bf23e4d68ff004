//! nativestart - package JVM applications behind a native launcher

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nativestart_cli::config::ProjectConfig;
use nativestart_cli::{Cli, Commands, cmd, keyfile};
use nativestart_packer::StubDirectory;

fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { name, force } => cmd::init::init(&cli.config, &name, force),
        Commands::Descriptor { systems, out, key } => {
            let config = ProjectConfig::load(&cli.config)?;
            let signing_key = key.load()?;
            cmd::descriptor::descriptor(&config, &systems, &out, signing_key.as_ref())?;
            Ok(())
        }
        Commands::Executable {
            systems,
            out,
            stubs,
            public_key,
            key,
        } => {
            let config = ProjectConfig::load(&cli.config)?;
            let verifying_key = match public_key {
                Some(path) => Some(keyfile::read_public_key(&path)?),
                None => key.load()?.map(|k| k.verifying_key()),
            };
            let stubs = StubDirectory::new(stubs);
            cmd::executable::executable(&config, &systems, &out, &stubs, verifying_key)?;
            Ok(())
        }
        Commands::Keygen { out_dir, name, force } => {
            cmd::keygen::keygen(&out_dir, &name, force)?;
            Ok(())
        }
        Commands::Hash { paths, algorithm } => cmd::hash::hash(&paths, algorithm),
        Commands::Verify {
            descriptor,
            public_key,
        } => cmd::verify::verify(&descriptor, &public_key),
    }
}
