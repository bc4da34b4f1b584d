use clap::Parser;
use std::path::PathBuf;
use vmstrap::InstallOptions;
use vmstrap_shared::constants::envs;

/// Provision a throwaway Arch Linux VM from a prebuilt root filesystem.
///
/// Wipes the target disk. Only runs as root, from the Arch live ISO,
/// booted in UEFI mode, inside VirtualBox or VMware.
#[derive(Parser, Debug)]
#[command(name = "vmstrap", author, version, about)]
pub struct Cli {
    /// Block device to wipe and install onto
    #[arg(long, env = envs::DEVICE)]
    pub device: Option<PathBuf>,

    /// JSON file overriding the default install options
    #[arg(long, env = envs::CONFIG)]
    pub config: Option<PathBuf>,

    /// Directory the downloaded payload is extracted into
    #[arg(long, env = envs::WORK_DIR)]
    pub work_dir: Option<PathBuf>,

    /// Base URL of the GitHub REST API
    #[arg(long, env = envs::API_URL)]
    pub api_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    pub fn install_options(&self) -> anyhow::Result<InstallOptions> {
        let mut options = match &self.config {
            Some(path) => InstallOptions::load(path)?,
            None => InstallOptions::default(),
        };

        if let Some(device) = &self.device {
            options.device = device.clone();
        }
        if let Some(work_dir) = &self.work_dir {
            options.work_dir = work_dir.clone();
        }
        if let Some(api_url) = &self.api_url {
            options.artifact.api_url = api_url.clone();
        }

        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "vmstrap",
            "--device",
            "/dev/vdb",
            "--api-url",
            "http://127.0.0.1:9",
            "-v",
        ])
        .unwrap();
        let options = cli.install_options().unwrap();

        assert_eq!(options.device, PathBuf::from("/dev/vdb"));
        assert_eq!(options.artifact.api_url, "http://127.0.0.1:9");
        assert_eq!(options.mount_root, PathBuf::from("/mnt"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_empty_device_rejected() {
        let cli = Cli::try_parse_from(["vmstrap", "--device", ""]).unwrap();
        assert!(cli.install_options().is_err());
    }
}
