use super::{httpd, zm};
use serde_derive::Deserialize;
use std::{collections::HashSet, env};
use tracing::Level;
use zmalarm_api::{Error, Result};

#[derive(Deserialize)]
pub struct Config {
    log_level: Option<String>,
    #[serde(default)]
    pub httpd: httpd::Config,
    pub host: Vec<zm::config::Params>,
}

impl Config {
    pub fn get_log_level(&self) -> Level {
        let v = self.log_level.as_deref().unwrap_or("warn");

        match v {
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::WARN,
        }
    }

    /// Checks the parts of the configuration that the TOML parser
    /// can't: there has to be at least one host, each host has to
    /// have valid parameters and host names have to be unique.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::ConfigError(String::from(
                "no [[host]] sections defined",
            )));
        }

        let mut names = HashSet::new();

        for host in &self.host {
            host.validate()?;

            if !names.insert(&host.name) {
                return Err(Error::ConfigError(format!(
                    "host '{}' is defined more than once",
                    &host.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: None,
            httpd: httpd::Config::default(),
            host: vec![],
        }
    }
}

struct Options {
    config: Option<String>,
    verbose: u8,
    print_cfg: bool,
}

fn from_cmdline() -> Options {
    use clap::{crate_version, Arg, ArgAction, Command};

    // Define the command line arguments.

    let matches = Command::new("zmalarmd")
        .version(crate_version!())
        .about("Raises ZoneMinder alarms and disarms them after a delay.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Specifies the configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Sets verbosity of log; can be used more than once")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("print_cfg")
                .long("print-config")
                .help("Displays the configuration and exits")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    Options {
        config: matches.get_one::<String>("config").cloned(),
        verbose: matches.get_count("verbose"),
        print_cfg: matches.get_flag("print_cfg"),
    }
}

// The number of '-v' options determines the log level. They override
// the level in the config file.

fn apply_verbosity(cfg: &mut Config, verbose: u8) {
    match verbose {
        0 => (),
        1 => cfg.log_level = Some(String::from("info")),
        2 => cfg.log_level = Some(String::from("debug")),
        _ => cfg.log_level = Some(String::from("trace")),
    }
}

fn parse_config(path: &str, contents: &str) -> Option<Config> {
    match toml::from_str(contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            print!("ERROR: {},\n       ignoring {}\n", e, path);
            None
        }
    }
}

async fn from_file(path: &str) -> Option<Config> {
    use tokio::fs;

    if let Ok(contents) = fs::read(path).await {
        let contents = String::from_utf8_lossy(&contents);

        parse_config(path, &contents)
    } else {
        None
    }
}

async fn find_cfg() -> Config {
    const CFG_FILE: &str = "zmalarm.toml";

    // Create a vector of directories that could contain a
    // configuration file. The directories will be searched in their
    // order within the vector.

    let mut dirs = vec![String::from("./")];

    // If the user has `HOME` defined, append their home directory to
    // the search path. Note the end of the path has a period. This is
    // done so the file will be named `.zmalarm.toml` in the home
    // directory.

    if let Ok(home) = env::var("HOME") {
        dirs.push(format!("{}/.", home))
    }

    // Add other, common configuration areas.

    dirs.push(String::from("/usr/local/etc/"));
    dirs.push(String::from("/usr/pkg/etc/"));
    dirs.push(String::from("/etc/"));

    // Iterate through the directories. The first file that is found
    // and can be parsed is used as the configuration.

    for dir in dirs {
        let file = format!("{}{}", &dir, CFG_FILE);

        if let Some(cfg) = from_file(&file).await {
            return cfg;
        }
    }
    Config::default()
}

fn dump_config(cfg: &Config) {
    println!("Configuration:");
    println!("    log level: {}", cfg.get_log_level());
    println!("    web server: {}\n", cfg.httpd.addr);

    println!("ZoneMinder hosts:");
    if !cfg.host.is_empty() {
        for ii in &cfg.host {
            println!(
                "    name: {}\n    url: {}\n    stream path: {}\n    \
                 user: {}\n    verify SSL: {}\n    TTL: {} sec\n",
                &ii.name,
                ii.server_url(),
                &ii.path_zms,
                ii.username.as_deref().unwrap_or("(none)"),
                ii.verify_ssl,
                ii.ttl
            )
        }
    } else {
        println!("    No hosts specified.");
    }
}

#[tracing::instrument(name = "loading config")]
pub async fn get() -> Option<Config> {
    let opts = from_cmdline();

    // A config file named on the command line has to be usable. If
    // none was given, search the usual places.

    let mut cfg = match &opts.config {
        Some(path) => match from_file(path).await {
            Some(cfg) => cfg,
            None => {
                println!("ERROR: couldn't load {}", path);
                return None;
            }
        },
        None => find_cfg().await,
    };

    apply_verbosity(&mut cfg, opts.verbose);

    if opts.print_cfg {
        dump_config(&cfg);
        None
    } else if let Err(e) = cfg.validate() {
        println!("ERROR: {}", e);
        None
    } else {
        Some(cfg)
    }
}
