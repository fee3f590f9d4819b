// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate image;
extern crate log;
extern crate mandelbrot;

use clap::{App, Arg, ArgMatches};
use failure::format_err;
use image::png::PNGEncoder;
use image::ColorType;
use log::LevelFilter;
use mandelbrot::request::{parse_complex, parse_pair};
use mandelbrot::partition::MAX_WORKERS;
use mandelbrot::{ImageBuffer, RasterConfig, RenderOptions, RenderRequest, Viewport};
use std::fs::File;
use std::io::BufWriter;
use std::str::FromStr;
use std::time::Duration;

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const UPPERLEFT: &str = "upperleft";
const LOWERRIGHT: &str = "lowerright";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const TIMEOUT: &str = "timeout";
const QUERY: &str = "query";
const VERBOSITY: &str = "verbosity";

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandelbrot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parallel Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (PNG)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1000x1000")
                .validator(|s| validate_pair::<u32>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(UPPERLEFT)
                .required(false)
                .long(UPPERLEFT)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.5,-2.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse upper left corner"))
                .help("Upper left corner of the complex plane"),
        )
        .arg(
            Arg::with_name(LOWERRIGHT)
                .required(false)
                .long(LOWERRIGHT)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1.0,2.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse lower right corner"))
                .help("Lower right corner of the complex plane"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range::<u32>(
                        &s,
                        1,
                        std::u32::MAX,
                        "Could not parse iteration count",
                        "Iteration count must be at least 1",
                    )
                })
                .help("Iterations after which a point is taken to be inside the set"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(|s| {
                    validate_range::<usize>(
                        &s,
                        1,
                        MAX_WORKERS,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", MAX_WORKERS),
                    )
                })
                .help("Number of worker threads (default: one per CPU)"),
        )
        .arg(
            Arg::with_name(TIMEOUT)
                .required(false)
                .long(TIMEOUT)
                .takes_value(true)
                .validator(|s| {
                    validate_range::<u64>(
                        &s,
                        1,
                        std::u64::MAX,
                        "Could not parse timeout",
                        "Timeout must be at least one second",
                    )
                })
                .help("Give up if the image is not finished after this many seconds"),
        )
        .arg(
            Arg::with_name(QUERY)
                .required(false)
                .long(QUERY)
                .short("q")
                .takes_value(true)
                .help("Render request as a query string, e.g. 'x1=-2&x2=1&width=640&maxIter=200'; replaces the size, corner, iteration and thread options"),
        )
        .arg(
            Arg::with_name(VERBOSITY)
                .required(false)
                .long(VERBOSITY)
                .short("v")
                .takes_value(true)
                .possible_values(&["off", "error", "warn", "info", "debug", "trace"])
                .help("Log level (overrides RUST_LOG)"),
        )
        .get_matches()
}

fn init_logging(matches: &ArgMatches) {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = matches.value_of(VERBOSITY) {
        if let Ok(level) = LevelFilter::from_str(level) {
            builder.filter_level(level);
        }
    }
    builder.init();
}

fn request_from(matches: &ArgMatches) -> Result<RenderRequest, failure::Error> {
    if let Some(query) = matches.value_of(QUERY) {
        return Ok(RenderRequest::from_query(query)?);
    }

    let size = matches.value_of(SIZE).unwrap_or_default();
    let (width, height) =
        parse_pair::<u32>(size, 'x').ok_or_else(|| format_err!("Error parsing image dimensions"))?;
    let upperleft = parse_complex(matches.value_of(UPPERLEFT).unwrap_or_default())
        .ok_or_else(|| format_err!("Error parsing upper left point"))?;
    let lowerright = parse_complex(matches.value_of(LOWERRIGHT).unwrap_or_default())
        .ok_or_else(|| format_err!("Error parsing lower right point"))?;
    let max_iter = u32::from_str(matches.value_of(ITERATIONS).unwrap_or_default())?;

    let mut request = RenderRequest {
        viewport: Viewport::from_corners(upperleft, lowerright),
        config: RasterConfig {
            width,
            height,
            max_iter,
        },
        ..RenderRequest::default()
    };
    if let Some(threads) = matches.value_of(THREADS) {
        request.workers = usize::from_str(threads)?;
    }
    Ok(request)
}

fn write_image(outfile: &str, image: &ImageBuffer) -> Result<(), failure::Error> {
    let output = BufWriter::new(File::create(outfile)?);
    let encoder = PNGEncoder::new(output);
    encoder.encode(
        image.as_bytes(),
        image.width(),
        image.height(),
        ColorType::RGBA(8),
    )?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let request = request_from(matches)?;
    let options = RenderOptions {
        timeout: matches
            .value_of(TIMEOUT)
            .map(u64::from_str)
            .transpose()?
            .map(Duration::from_secs),
        ..RenderOptions::default()
    };
    let image = mandelbrot::render_with(&request, &options)?;
    write_image(matches.value_of(OUTPUT).unwrap_or_default(), &image)
}

fn main() {
    let matches = args();
    init_logging(&matches);
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
