//! Uplink command line interface.

use std::process;
use std::time::Duration;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_t, App, AppSettings::*, Arg,
};
use console::style;
use log::{debug, trace, warn, LevelFilter};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use simplelog::*;

use uplink::ui::{poll_input, Renderer};
use uplink::wizard::{self, InputEvent};
use uplink::{self as ul, FakeLink, LinkAdapter, SerialLink};

fn main() {
    println!("[UP] uplink v{}", crate_version!());

    ctrlc::set_handler(move || {
        println!("🛑 received Ctrl+C!");
        process::exit(0);
    })
    .expect("Failed to install my Ctrl-C handler!");

    let matches = App::new(crate_name!())
        .version(format!("v{}", crate_version!()).as_str())
        .author(crate_authors!())
        .about(crate_description!())
        .long_about(
            "\n\
            Uplink drives a small on-screen wizard that pushes a payload \
            file to a peripheral device over a serial link. The wizard \
            checks that the peripheral is connected, loads the payload into \
            memory, pushes it over the link and reports progress and \
            completion on the console.\n\
            \n\
            Navigation: Enter confirms, Esc goes back, q exits.\n\
            \n\
            When no serial device is given, uplink runs against a simulated \
            link so the wizard can be exercised without hardware.\
        ",
        )
        .max_term_width(80)
        .setting(ColoredHelp)
        .setting(NextLineHelp)
        .arg(
            Arg::with_name("DEVICE_TTY")
                .help("the serial tty device the peripheral is attached to")
                .long_help(
                    "the serial tty device the peripheral is attached to; \
                     may change when the peripheral is unplugged and \
                     re-plugged and may differ between systems. When not \
                     given, a simulated link is used.",
                )
                .short("-t")
                .long("--tty")
                .takes_value(true)
                .require_equals(true),
        )
        .arg(
            Arg::with_name("BAUD_RATE")
                .help("serial port baud rate")
                .long_help("serial baud rate")
                .short("-b")
                .long("--baud-rate")
                .takes_value(true)
                .default_value("115200")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("DATA_BITS")
                .help("number of bits per character")
                .short("-d")
                .long("--data-bits")
                .takes_value(true)
                .possible_values(&["5", "6", "7", "8"])
                .default_value("8")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("STOP_BITS")
                .help("number of stop bits per byte")
                .short("-s")
                .long("--stop-bits")
                .takes_value(true)
                .possible_values(&["1", "2"])
                .default_value("1")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("PARITY")
                .help("parity checking protocol")
                .short("-p")
                .long("--parity")
                .takes_value(true)
                .possible_values(&["none", "odd", "even"])
                .default_value("none")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("FLOW_CONTROL")
                .help("flow control mode")
                .short("-f")
                .long("--flow-control")
                .takes_value(true)
                .possible_values(&["none", "soft", "hard"])
                .default_value("none")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("TICK_MS")
                .help("wizard tick period in milliseconds")
                .long("--tick")
                .takes_value(true)
                .default_value("50")
                .require_equals(true),
        )
        .arg(
            Arg::with_name("PAYLOAD")
                .help("path to the payload file to be pushed")
                .long_help(
                    "path to the payload file to be pushed; when not set, \
                     uplink will look for `payload.bin` in the current \
                     working directory.",
                )
                .index(1),
        )
        .arg(Arg::with_name("v").short("v").multiple(true).help(
            "Sets the logging level of verbosity, repeat several times for \
                higher verbosity",
        ))
        .get_matches();

    // Vary the output based on how many times the user used the "verbose" flag
    // (i.e. 'uplink -v -v -v' or 'uplink -vvv' vs 'uplink -v'
    let log_level: LevelFilter;
    match matches.occurrences_of("v") {
        0 => log_level = LevelFilter::Warn,
        1 => log_level = LevelFilter::Info,
        2 => log_level = LevelFilter::Debug,
        _ => log_level = LevelFilter::Trace,
    }

    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    trace!("{:#?}", matches);

    // Arguments with default values ===========================================

    // It's safe to call unwrap on all command line arguments with default
    // values, because the value with either be what the user input at runtime
    // or the default value

    let baud_rate = value_t!(matches.value_of("BAUD_RATE"), u32).unwrap_or_else(|_| {
        println!(
            "{}: `{}` needs to be a numeric value",
            style("error").red(),
            style("baud-rate").cyan()
        );
        println!(
            "   {} `{}` is not a valid value",
            style("-->").cyan(),
            style(matches.value_of("BAUD_RATE").unwrap()).on_red()
        );
        process::exit(-1);
    });

    let tick_millis = value_t!(matches.value_of("TICK_MS"), u64).unwrap_or_else(|_| {
        println!(
            "{}: `{}` needs to be a numeric value",
            style("error").red(),
            style("tick").cyan()
        );
        println!(
            "   {} `{}` is not a valid value",
            style("-->").cyan(),
            style(matches.value_of("TICK_MS").unwrap()).on_red()
        );
        process::exit(-1);
    });

    let data_bits = match matches.value_of("DATA_BITS").unwrap() {
        "5" => DataBits::Five,
        "6" => DataBits::Six,
        "7" => DataBits::Seven,
        "8" => DataBits::Eight,
        _ => unreachable!(),
    };

    let stop_bits = match matches.value_of("STOP_BITS").unwrap() {
        "1" => StopBits::One,
        "2" => StopBits::Two,
        _ => unreachable!(),
    };

    let parity = match matches.value_of("PARITY").unwrap() {
        "none" => Parity::None,
        "even" => Parity::Even,
        "odd" => Parity::Odd,
        _ => unreachable!(),
    };

    let flow_control = match matches.value_of("FLOW_CONTROL").unwrap() {
        "none" => FlowControl::None,
        "soft" => FlowControl::Software,
        "hard" => FlowControl::Hardware,
        _ => unreachable!(),
    };

    // END - Arguments with default values =====================================

    let mut settings = ul::SettingsBuilder::default()
        .baud_rate(baud_rate)
        .data_bits(data_bits)
        .stop_bits(stop_bits)
        .parity(parity)
        .flow_control(flow_control)
        .tick_millis(tick_millis)
        .finalize();

    // START - Arguments with NO default values ================================

    if matches.is_present("DEVICE_TTY") {
        settings.path = Some(matches.value_of("DEVICE_TTY").unwrap().into());
    }

    if matches.is_present("PAYLOAD") {
        settings.payload = Some(matches.value_of("PAYLOAD").unwrap().into());
    }

    // END - Arguments =========================================================

    // Run the state machine ===================================================

    let link: Box<dyn LinkAdapter> = match settings.path {
        Some(_) => Box::new(SerialLink::new(settings.clone())),
        None => {
            warn!("no serial device given, running against a simulated link");
            Box::new(FakeLink::new(true))
        }
    };
    let store = Box::new(ul::DiskStore::new());

    let tick = Duration::from_millis(settings.tick_millis);
    let mut renderer = Renderer::new(settings.tick_millis);
    let mut wizard = wizard::factory(settings, store, link);

    while !wizard.is_finished() {
        let input = poll_input(tick).unwrap_or(InputEvent::Idle);
        wizard.step(input);
        if let Err(e) = renderer.render(&wizard.snapshot()) {
            debug!("render error: {}", e);
        }
    }

    debug!("wizard finished");
    process::exit(0);
}
