//! Point Windows users at a usable FFmpeg before ffmpeg-next's own build
//! script fails with a less helpful linker error.

use std::{env, path::PathBuf};

const WATCHED_VARIABLES: [&str; 4] = [
    "FFMPEG_DIR",
    "VCPKG_ROOT",
    "VCPKGRS_DYNAMIC",
    "VCPKGRS_TRIPLET",
];

fn warn(message: &str) {
    println!("cargo:warning=slidegrab: {message}");
}

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        warn("FFMPEG_DIR is not set; install FFmpeg with vcpkg and point FFMPEG_DIR at it");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);

    if !candidate.is_dir() {
        warn(&format!("no vcpkg FFmpeg found under {}", candidate.display()));
        return;
    }

    warn(&format!(
        "found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to make discovery explicit",
        candidate.display()
    ));
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        warn("set VCPKGRS_DYNAMIC=1 if the vcpkg FFmpeg build is dynamic");
    }
}
