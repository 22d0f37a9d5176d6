// src/main.rs
// Command-line application for Scope CSV Reader

use std::env;
use std::path::Path;
use std::process;
use scopecsv_reader::{Capture, CaptureLoader, Channel, ChannelRecord, Result};

fn print_usage() {
    eprintln!("Usage: scopecsv_reader <command> <path> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <path>               Display capture information (file or folder)");
    eprintln!("  header <file>             Print the parsed header as JSON");
    eprintln!("  export <path> <output>    Write a merged Time,CH1,CH2 CSV");
    eprintln!("  extract <path> <channel>  Print one channel (CH1/CH2) to stdout");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  scopecsv_reader info ALL0001");
    eprintln!("  scopecsv_reader header ALL0001/F0001CH1.CSV");
    eprintln!("  scopecsv_reader export ALL0001 merged.csv");
    eprintln!("  scopecsv_reader extract ALL0001 CH2 > ch2.txt");
}

fn load(loader: &CaptureLoader, input: &str) -> Result<Capture> {
    if Path::new(input).is_dir() {
        loader.load_directory(input)
    } else {
        loader.load_single(input)
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];
    let input = &args[2];
    let loader = CaptureLoader::default();

    if command == "header" {
        let header = match loader.load_header(input) {
            Ok(h) => h,
            Err(e) => {
                eprintln!("Error reading header of '{}': {}", input, e);
                process::exit(1);
            }
        };
        match serde_json::to_string_pretty(&header) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error encoding header: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let capture = match load(&loader, input) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading capture '{}': {}", input, e);
            process::exit(1);
        }
    };

    match command.as_str() {
        "info" => {
            print_capture_info(&capture);
        }

        "export" => {
            if args.len() < 4 {
                eprintln!("Error: Missing output file argument");
                print_usage();
                process::exit(1);
            }

            let output_file = &args[3];
            if let Err(e) = capture.write_csv(output_file) {
                eprintln!("Error writing CSV file '{}': {}", output_file, e);
                process::exit(1);
            }

            println!("Successfully exported {} to {}", input, output_file);
        }

        "extract" => {
            if args.len() < 4 {
                eprintln!("Error: Missing channel argument");
                print_usage();
                process::exit(1);
            }

            let channel: Channel = match args[3].parse() {
                Ok(c) => c,
                Err(_) => {
                    eprintln!("Error: Invalid channel '{}' (expected CH1 or CH2)", args[3]);
                    process::exit(1);
                }
            };

            match capture.channel(channel) {
                Some(record) => {
                    let header = record.header();
                    println!("# {} from {}", channel, input);
                    println!("# Time ({}), Value ({})", header.horizontal_units, header.vertical_units);

                    for (t, v) in record.time().iter().zip(record.value()) {
                        println!("{:.12e}, {:.6e}", t, v);
                    }
                }
                None => {
                    eprintln!("Error: {} not present in '{}'", channel, input);
                    process::exit(1);
                }
            }
        }

        _ => {
            eprintln!("Error: Unknown command '{}'", command);
            print_usage();
            process::exit(1);
        }
    }
}

fn print_capture_info(capture: &Capture) {
    println!("Capture Information");
    println!("===================");
    println!();
    if let Some(path) = capture.input_path() {
        println!("Path: {}", path.display());
    }
    println!("Channels: {}", capture.channels().count());
    println!();

    for record in capture.channels() {
        print_channel_info(record);
    }
}

fn print_channel_info(record: &ChannelRecord) {
    let header = record.header();

    println!("{}:", record.channel());
    println!("  Instrument: {} (S/N {}, {})",
             header.model_number, header.serial_number, header.firmware_version);
    println!("  Samples: {} (record length {})", record.len(), header.record_length);
    println!("  Sample interval: {:.3e} {} ({:.3} MHz sample rate)",
             header.sample_interval, header.horizontal_units, header.sample_rate() / 1e6);
    println!("  Trigger point: sample {}", header.trigger_point);
    println!("  Vertical: {} {}/div, offset {} {}",
             header.vertical_scale, header.vertical_units,
             header.vertical_offset, header.vertical_units);
    println!("  Horizontal: {} {}/div", header.horizontal_scale, header.horizontal_units);
    println!("  Probe attenuation: {}x", header.probe_attenuation);

    if !record.is_empty() {
        let values = record.value();
        let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        let rms = (values.iter().map(|&x| x * x).sum::<f64>() / values.len() as f64).sqrt();

        println!("  Data range: {:.3} to {:.3} {}", min, max, header.vertical_units);
        println!("  Peak-to-peak: {:.3}, avg={:.3}, rms={:.3}", max - min, avg, rms);
    }
    println!();
}
