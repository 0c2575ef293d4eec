use clap::Parser;
use common::protocol::DEFAULT_ENDPOINT;
use detect_client::{
    client::DetectionClient,
    controller::ViewController,
    presenter::TerminalPresenter,
    sensors::{acquire_camera, CameraConfig, MJPG},
};
use env_logger::TimestampPrecision;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[clap(author, version)]
struct Args {
    /// URL of the detection endpoint
    #[clap(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Video device to capture from
    #[clap(long, default_value = "/dev/video0")]
    device: String,

    /// Pixel format requested from the device
    #[clap(long, default_value = MJPG)]
    format: String,

    /// Capture width, the largest supported when unset
    #[clap(long, requires = "height")]
    width: Option<u32>,

    /// Capture height, the largest supported when unset
    #[clap(long, requires = "width")]
    height: Option<u32>,

    /// Frames per second, the highest supported when unset
    #[clap(long)]
    fps: Option<u32>,

    /// File the detection result is written to
    #[clap(long, default_value = "detection_result.jpg")]
    output: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::builder()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    let camera_config = CameraConfig {
        device: args.device,
        format: args.format,
        resolution: args.width.zip(args.height),
        frame_rate: args.fps.map(|fps| (1, fps)),
    };

    let client = DetectionClient::new(args.endpoint);
    let presenter = TerminalPresenter::new(args.output);
    log::info!(
        "Sending detections to {}, results go to {}",
        client.endpoint(),
        presenter.output().display()
    );

    let mut controller = ViewController::new(client, presenter);

    controller
        .run(BufReader::new(tokio::io::stdin()), || {
            acquire_camera(&camera_config)
        })
        .await?;

    log::info!("Bye");
    Ok(())
}
