//! Request a styled QR code and save it under out/output
//!
//! Usage: ACCESS_TOKEN=... cargo run --example generate_qr

use qrgen::{AccessToken, ImageFormat, Parameter, QrGenerator, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut generator = QrGenerator::new(
        Settings::default(),
        Some(AccessToken::FromEnv),
        [("qr_code_text", "Hello from qrgen!"), ("frame_text", "Scan me")],
    )?;

    // Plain SVG with a framed caption
    let svg = generator.request(Some("hello")).await?;
    println!("✓ QR code saved to {}", svg.display());

    // Same content as PNG with red modules
    let params = generator.parameters_mut();
    params.set(Parameter::ImageFormat, ImageFormat::Png);
    params.set(Parameter::ForegroundColor, "#CC0000");
    params.set(Parameter::FrameName, "bottom-frame");

    let png = generator.request(Some("hello-red")).await?;
    println!("✓ PNG variant saved to {}", png.display());

    Ok(())
}
