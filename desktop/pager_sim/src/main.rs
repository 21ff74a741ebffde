/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{
    fs::File,
    io::{self, LineWriter, Write},
    process,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use clap::{Arg, ArgAction, ArgMatches, Command};
use env_logger::{Builder, Env};
use log::{error, info};
use vm_pager::{
    modules::{
        replacement::LruReplacementModule, spawner::ThreadSpawnerModule,
        transport::ChannelTransportModule,
    },
    Pager, PagerConfig, PagerError, Watchdog, WorkerConfig, MAX_CLIENTS, MAX_FRAME_COUNT,
    MAX_PROCESS_BUDGET, NANOS_PER_MS,
};

const LOG_FILE: &str = "ossLog.txt";
const DEFAULT_WATCHDOG_SECS: u64 = 3;

struct Options {
    process_budget: usize,
    concurrency_cap: usize,
    spawn_interval_ns: u64,
    frame_count: usize,
    watchdog_secs: u64,
    log_to_file: bool,
}

/// Writes everything to stdout and, if enabled, to the log file
struct OutputSink {
    stdout: io::Stdout,
    logfile: Option<LineWriter<File>>,
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdout.write_all(buf)?;
        if let Some(logfile) = self.logfile.as_mut() {
            logfile.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()?;
        if let Some(logfile) = self.logfile.as_mut() {
            logfile.flush()?;
        }
        Ok(())
    }
}

fn print_usage(app: &str) {
    println!(
        "usage: {} [-h] [-n proc] [-s simul] [-i intervalInMsToLaunchChildren] [-f] [-m frames] [-t seconds]",
        app
    );
    println!("      proc is the number of total children to launch");
    println!("      simul indicates how many children are to be allowed to run simultaneously");
    println!("      interval is the time between launching children");
    println!("      selecting f will output to a logfile as well");
    println!("      frames is the number of physical frames (default 8)");
    println!("      seconds is the real time limit of the simulation (default 3)");
}

fn command() -> Command {
    Command::new("pager_sim")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(Arg::new("help").short('h').action(ArgAction::SetTrue))
        .arg(Arg::new("proc").short('n').value_name("proc"))
        .arg(Arg::new("simul").short('s').value_name("simul"))
        .arg(Arg::new("interval").short('i').value_name("interval"))
        .arg(Arg::new("logfile").short('f').action(ArgAction::SetTrue))
        .arg(Arg::new("frames").short('m').value_name("frames"))
        .arg(Arg::new("timeout").short('t').value_name("seconds"))
}

/// Only plain digits are accepted
fn parse_number(value: &str) -> Result<u64, String> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("{} is not a valid number.", value));
    }
    value
        .parse()
        .map_err(|_| format!("{} is not a valid number.", value))
}

fn number_arg(matches: &ArgMatches, id: &str) -> Result<Option<u64>, String> {
    matches
        .get_one::<String>(id)
        .map(|value| parse_number(value))
        .transpose()
}

fn parse_options(matches: &ArgMatches) -> Result<Options, String> {
    let process_budget = number_arg(matches, "proc")?
        .unwrap_or(1)
        .min(MAX_PROCESS_BUDGET as u64) as usize;

    let concurrency_cap = number_arg(matches, "simul")?.unwrap_or(1);
    if concurrency_cap > MAX_CLIENTS as u64 {
        return Err(format!(
            "Value entered for options s cannot exceed {}. {} > {}.",
            MAX_CLIENTS, concurrency_cap, MAX_CLIENTS
        ));
    }

    let spawn_interval_ns = number_arg(matches, "interval")?
        .unwrap_or(0)
        .saturating_mul(NANOS_PER_MS);

    let frame_count = number_arg(matches, "frames")?.unwrap_or(8);
    if frame_count == 0 || frame_count > MAX_FRAME_COUNT as u64 {
        return Err(format!(
            "Value entered for options m has to be in [1, {}].",
            MAX_FRAME_COUNT
        ));
    }

    Ok(Options {
        process_budget,
        concurrency_cap: concurrency_cap as usize,
        spawn_interval_ns,
        frame_count: frame_count as usize,
        watchdog_secs: number_arg(matches, "timeout")?.unwrap_or(DEFAULT_WATCHDOG_SECS),
        log_to_file: matches.get_flag("logfile"),
    })
}

fn run(options: Options, out: &mut OutputSink) -> Result<(), PagerError> {
    let config = PagerConfig {
        frame_count: options.frame_count,
        process_budget: options.process_budget,
        concurrency_cap: options.concurrency_cap,
        spawn_interval_ns: options.spawn_interval_ns,
        ..Default::default()
    };

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0);
    let spawner = ThreadSpawnerModule::new(WorkerConfig::default(), seed);
    let kill_switch = spawner.kill_switch();

    let mut pager: Pager<LruReplacementModule, _, _> =
        Pager::new(config, ChannelTransportModule::new(), spawner)?;

    let watchdog_secs = options.watchdog_secs;
    let watchdog = Watchdog::arm(Duration::from_secs(watchdog_secs), move || {
        println!(
            "{} seconds have passed, process(es) will now terminate.",
            watchdog_secs
        );
        kill_switch.trigger();
        process::exit(1);
    })?;

    let report = match pager.run(out) {
        Ok(report) => report,
        Err(e) => {
            pager.kill_all();
            return Err(e);
        }
    };
    watchdog.disarm();

    writeln!(out, "{}", report)?;
    out.flush()?;

    info!("Finished after {} simulated", pager.clock());
    Ok(())
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_module_path(false)
        .init();

    let app = std::env::args()
        .next()
        .unwrap_or_else(|| "pager_sim".to_string());

    let matches = match command().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            eprintln!("Error! {}.", e.kind());
            print_usage(&app);
            process::exit(1);
        }
    };

    if matches.get_flag("help") {
        print_usage(&app);
        return;
    }

    let options = match parse_options(&matches) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error! {}", message);
            print_usage(&app);
            process::exit(1);
        }
    };

    let logfile = if options.log_to_file {
        match File::create(LOG_FILE) {
            Ok(file) => Some(LineWriter::new(file)),
            Err(e) => {
                eprintln!("Error! Failed to open logfile: {}", e);
                process::exit(1);
            }
        }
    } else {
        None
    };

    let mut out = OutputSink {
        stdout: io::stdout(),
        logfile,
    };

    if let Err(e) = run(options, &mut out) {
        error!("{}", e);
        eprintln!("Error! {}", e);
        process::exit(1);
    }
}
