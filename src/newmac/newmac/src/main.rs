extern crate clap;
use log::{debug, error};

mod app;
mod settings;

use app::{AppError, Target};
use newmac_devmem::{DevMem, SystemEntropy};
use settings::Settings;

/// Configures command-line interface using clap
fn get_cli_config<'a, 'b>() -> clap::App<'a, 'b> {
    let description = "Program a new MAC address into the LAN9221 EEPROM \
                       (bring the interface down first)";
    clap::App::new("newmac")
        .version("0.1")
        .about(description)
        .arg(
            clap::Arg::with_name("ADDRESS")
                .help("Address to store, as xx:xx:xx:xx:xx:xx")
                .index(1),
        )
        .arg(
            clap::Arg::with_name("random")
                .short("r")
                .help("Store a random locally administered address"),
        )
        .group(
            clap::ArgGroup::with_name("target")
                .args(&["ADDRESS", "random"])
                .required(true),
        )
}

fn target_from(matches: &clap::ArgMatches) -> Result<Target, AppError> {
    if matches.is_present("random") {
        return Ok(Target::Random);
    }
    let text = matches.value_of("ADDRESS").unwrap_or_default();
    Target::parse(text)
}

fn run(settings: &Settings, target: Target) -> Result<(), AppError> {
    let mut window = DevMem::board()?;
    if settings.verbose {
        println!("/dev/mem opened.");
        println!("Memory mapped at address {:p}.", window.as_ptr());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app::provision(settings, &mut window, target, &mut SystemEntropy::new(), &mut out)?;
    Ok(())
}

fn main() {
    let settings = Settings::from_env();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_filter()),
    )
    .init();

    // Usage problems exit here, before the hardware is touched
    let cli_matches = get_cli_config().get_matches();

    let result = target_from(&cli_matches).and_then(|target| run(&settings, target));
    if let Err(err) = &result {
        debug!("{:?}", err);
        error!("{}", err);
    }
    std::process::exit(app::exit_code(&result));
}
