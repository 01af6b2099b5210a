use std::env;
use std::net::IpAddr;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub port: Option<u16>,
    pub host: Option<IpAddr>,
    pub help: bool,
}

pub fn parse_args() -> Result<CliArgs, String> {
    parse_from(env::args().skip(1))
}

pub fn parse_from(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut args = args.into_iter();
    let mut parsed = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--port" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --port".to_string())?;
                let port = value
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port value: {value}"))?;
                parsed.port = Some(port);
            }
            "--host" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --host".to_string())?;
                let host = value
                    .parse::<IpAddr>()
                    .map_err(|_| format!("invalid host address: {value}"))?;
                parsed.host = Some(host);
            }
            "--help" | "-h" => {
                parsed.help = true;
            }
            _ => {
                return Err(format!("unknown argument: {arg}"));
            }
        }
    }

    Ok(parsed)
}

pub fn print_help() {
    println!(
        "folio: portfolio telemetry server\n\n\
Usage:\n  folio [--port <port>] [--host <addr>]\n\n\
Options:\n  --port <port>  Override the configured port for this run only\n  --host <addr>  Address to listen on (default 127.0.0.1)\n  -h, --help     Show this help message\n\n\
Secrets are read from the environment or a .env file; logging from FOLIO_LOG.\n"
    );
}
