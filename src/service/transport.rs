//! Line-delimited JSON transport: one request object per line in, one
//! response object per line out.

use anyhow::{Context, Result};
use log::{info, warn};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use super::SimulationService;

/// Serves requests from `reader` until end of input
///
/// Returns the number of requests handled. Blank lines are skipped.
pub fn serve_lines<R: BufRead, W: Write>(
    service: &SimulationService,
    reader: R,
    mut writer: W,
) -> Result<usize> {
    let mut handled = 0;
    for line in reader.lines() {
        let line = line.context("Failed to read request line")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = service.handle_json(&line);
        serde_json::to_writer(&mut writer, &response).context("Failed to encode response")?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .context("Failed to write response")?;
        handled += 1;
    }
    Ok(handled)
}

/// Accepts TCP connections on `addr`, serving each on its own thread
pub fn serve_tcp(service: Arc<SimulationService>, addr: &str) -> Result<()> {
    let listener =
        TcpListener::bind(addr).with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}", listener.local_addr()?);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };
        let service = Arc::clone(&service);
        thread::spawn(move || {
            if let Err(e) = serve_connection(&service, stream) {
                warn!("Connection ended with error: {:#}", e);
            }
        });
    }
    Ok(())
}

fn serve_connection(service: &SimulationService, stream: TcpStream) -> Result<()> {
    let peer = stream.peer_addr().context("Connection has no peer address")?;
    info!("Client connected: {}", peer);
    let reader = BufReader::new(stream.try_clone().context("Failed to clone stream")?);
    let handled = serve_lines(service, reader, stream)?;
    info!("Client {} disconnected after {} requests", peer, handled);
    Ok(())
}
