// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Streamplane Project. All Rights Reserved.

use clap::Parser;

/// Command-line arguments for the presentation probe.
///
/// The probe binds the display plane the same way a streaming session
/// would, pushes one synthetic NV12 frame through the full path, and
/// reports what the device offers. Arguments can be given on the command
/// line or through environment variables.
///
/// # Example
///
/// ```bash
/// # Probe the first card, holding the test frame for two seconds
/// streamplane --device /dev/dri/card0
///
/// # Exercise the HDR metadata property as well
/// HDR_PROBE=true streamplane
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Display device node used for presentation
    #[arg(short, long, env = "DRM_DEVICE", default_value = "/dev/dri/card0")]
    pub device: String,

    /// Connector to present on (defaults to the first connected one)
    #[arg(long, env = "CONNECTOR")]
    pub connector: Option<u32>,

    /// Test frame resolution in pixels (width height)
    #[arg(
        short,
        long,
        env = "FRAME_SIZE",
        default_value = "1280 720",
        value_delimiter = ' ',
        num_args = 2
    )]
    pub size: Vec<u32>,

    /// Seconds to keep the test frame on the plane
    #[arg(long, env = "HOLD", default_value = "2")]
    pub hold: u64,

    /// Negotiate for 10-bit HDR content
    #[arg(long, env = "HDR10")]
    pub hdr10: bool,

    /// Toggle the HDR metadata property with a zeroed infoframe
    #[arg(long, env = "HDR_PROBE")]
    pub hdr_probe: bool,

    /// Log to journald in addition to stderr
    #[arg(long, env = "JOURNALD")]
    pub journald: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
