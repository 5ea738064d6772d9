use clap::Parser;

/// SunSpec Bridge - polls Modbus devices and decodes their registers
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read
    #[clap(short = 'c', long = "config", default_value = "config.yaml")]
    pub config_file: String,

    /// Read every device once, print the decoded values and exit
    #[clap(long = "once")]
    pub once: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_config_yaml() {
        let options = Options::parse_from(["sunspec-bridge"]);
        assert_eq!(options.config_file, "config.yaml");
        assert!(!options.once);

        let options = Options::parse_from(["sunspec-bridge", "-c", "/etc/bridge.yaml", "--once"]);
        assert_eq!(options.config_file, "/etc/bridge.yaml");
        assert!(options.once);
    }
}
