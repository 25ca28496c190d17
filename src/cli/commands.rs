use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "peerpay", about = "Pay peers discovered on the local network")]
pub struct Opt {
    #[arg(long, help = "Set name of the peer")]
    pub name: Option<String>,
    #[arg(
        long,
        help = "Set the address of your system, example 192.168.0.103:3030"
    )]
    pub addr: Option<String>,
    #[arg(long, help = "Enable debug mode")]
    pub debug: bool,
    #[arg(long, help = "Read name, address and discovery settings from a TOML file")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let opt = Opt::try_parse_from([
            "peerpay",
            "--name",
            "Alice",
            "--addr",
            "127.0.0.1:3030",
            "--debug",
        ])
        .unwrap();
        assert_eq!(opt.name.as_deref(), Some("Alice"));
        assert_eq!(opt.addr.as_deref(), Some("127.0.0.1:3030"));
        assert!(opt.debug);
        assert!(opt.config.is_none());
    }
}
