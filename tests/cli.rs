extern crate assert_cmd;
extern crate image;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use image::GenericImageView;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn renders_a_png() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mandel.png");
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&["-o", out.to_str().unwrap(), "-s", "64x48", "-i", "50", "-t", "3"])
        .assert()
        .success();

    let img = image::open(&out).unwrap();
    assert_eq!(img.dimensions(), (64, 48));
    let rgba = img.to_rgba();
    assert!(rgba.pixels().all(|p| p[3] == 255));
}

#[test]
fn accepts_negative_corners() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("zoom.png");
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&[
            "-o",
            out.to_str().unwrap(),
            "-s",
            "32x32",
            "-l",
            "-0.8,-0.2",
            "-r",
            "-0.6,0.0",
            "-i",
            "100",
        ])
        .assert()
        .success();
    assert!(out.exists());
}

#[test]
fn renders_from_a_query_string() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("query.png");
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&[
            "-o",
            out.to_str().unwrap(),
            "-q",
            "x1=-2&y1=-1&x2=1&y2=1&width=30&height=20&maxIter=25",
        ])
        .assert()
        .success();
    let img = image::open(&out).unwrap();
    assert_eq!(img.dimensions(), (30, 20));
}

#[test]
fn rejects_an_inverted_viewport() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("never.png");
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&[
            "-o",
            out.to_str().unwrap(),
            "-s",
            "10x10",
            "-l",
            "1.0,1.0",
            "-r",
            "-1.0,-1.0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid viewport"));
    assert!(!out.exists());
}

#[test]
fn rejects_zero_iterations() {
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&["-o", "unused.png", "-i", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Iteration count must be at least 1"));
}

#[test]
fn rejects_a_bad_query() {
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&["-o", "unused.png", "-q", "width=wide"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse parameter width"));
}

#[test]
fn rejects_absurd_thread_counts() {
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&["-o", "unused.png", "-s", "4x4", "-t", "18446744073709551615"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Thread count must be between 1 and 256"));
}

#[test]
fn rejects_absurd_worker_counts_in_a_query() {
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&["-o", "unused.png", "-q", "width=4&height=4&workers=100000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse parameter workers from '100000'"));
}
