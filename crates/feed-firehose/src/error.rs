use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FirehoseError {
    #[snafu(display("failed to connect to firehose at {url}"))]
    Connect {
        url: String,
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[snafu(display("websocket transport error"))]
    Transport {
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[snafu(display("exhausted {attempts} reconnect attempts"))]
    ReconnectExhausted { attempts: u32 },
    #[snafu(display("malformed frame header"))]
    FrameHeader { source: serde_ipld_dagcbor::DecodeError<std::convert::Infallible> },
    #[snafu(display("malformed CAR block map"))]
    CarBlocks { source: std::io::Error },
}
