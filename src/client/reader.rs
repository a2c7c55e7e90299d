//! Read loop: transport → decoder → dispatcher.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::protocol::{decode_response, Response};
use crate::transport::FrameSource;

/// Pull frames off `source` until the connection ends or the session shuts
/// down.
///
/// Undecodable frames are logged and skipped. Returning drops `responses`,
/// which the dispatcher treats as the end of the session.
pub(crate) async fn run_read_loop<R: FrameSource>(
    mut source: R,
    responses: mpsc::Sender<Response>,
    shutdown: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            () = shutdown.cancelled() => {
                log::debug!("[Almond] Read loop stopping on shutdown");
                return;
            }
            frame = source.recv() => frame,
        };

        let text = match frame {
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                log::warn!("[Almond] Failed to read frame: {}", e);
                return;
            }
            None => {
                log::info!("[Almond] Hub connection ended");
                return;
            }
        };

        let response = match decode_response(&text) {
            Ok(response) => response,
            Err(e) => {
                log::warn!(
                    "[Almond] Dropping undecodable frame: {} ({})",
                    e,
                    preview(&text)
                );
                continue;
            }
        };

        log::trace!(
            "[Almond] Decoded {} (MobileInternalIndex={:?})",
            response.command_type(),
            response.correlation_id()
        );

        tokio::select! {
            () = shutdown.cancelled() => return,
            sent = responses.send(response) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

/// First 200 bytes of a frame for log output, cut on a char boundary.
fn preview(text: &str) -> &str {
    let mut end = text.len().min(200);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
