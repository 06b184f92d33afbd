//! Transport layer for native calls.
//!
//! A [`Transport`] carries one [`Request`] to the controller and brings back
//! one [`Reply`]. It knows nothing about error classification or
//! fragmentation; a non-zero status is returned as data, not as an error.
//!
//! Two implementations ship with the crate:
//!
//! - [`TcpTransport`] - blocking TCP link framed by [`FrameHeader`](crate::FrameHeader),
//!   with a timeout on every read and write
//! - [`SimulatedController`](crate::SimulatedController) - in-memory
//!   controller for tests and demos
//!
//! # Example
//!
//! ```no_run
//! use focas_client::{Request, TcpTransport, Transport};
//! use std::time::Duration;
//!
//! let mut transport = TcpTransport::connect("172.18.0.4", 8193, Duration::from_secs(10))?;
//! let reply = transport.call(&Request::read_id())?;
//! println!("status {}", reply.status);
//! transport.close();
//! # Ok::<(), focas_client::FocasError>(())
//! ```

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{FocasError, Result};
use crate::frame::{encode_request, FrameHeader, FRAME_HEADER_SIZE};
use crate::reply::Reply;
use crate::request::{Function, Request};

/// Carries native calls to a controller.
///
/// Implementations are used by exactly one [`Session`](crate::Session), which
/// serializes all calls.
pub trait Transport {
    /// Performs one request/reply exchange.
    ///
    /// # Errors
    ///
    /// Returns a `Connection`-class error if the exchange could not complete,
    /// or `FocasError::InvalidResponse` if the reply is malformed. A non-zero
    /// native status is not an error at this layer.
    fn call(&mut self, request: &Request) -> Result<Reply>;

    /// Releases the link. Must tolerate being called more than once.
    fn close(&mut self);
}

/// Blocking TCP link to a controller.
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpTransport {
    /// Connects to `host:port`, trying every resolved address in turn.
    ///
    /// `timeout` bounds the connect attempt and every later read and write.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::Connect` if the host cannot be resolved or no
    /// address accepts the connection.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| FocasError::connect(host, port, format!("cannot resolve: {e}")))?
            .collect();

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Self::from_stream(stream, addr, timeout),
                Err(e) => {
                    debug!(%addr, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let reason = match last_error {
            Some(e) => e.to_string(),
            None => "no addresses resolved".to_string(),
        };
        Err(FocasError::connect(host, port, reason))
    }

    fn from_stream(stream: TcpStream, peer: SocketAddr, timeout: Duration) -> Result<Self> {
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        debug!(%peer, "connected to CNC");
        Ok(Self { stream, peer })
    }

    /// Returns the controller address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn exchange(&mut self, frame: &[u8]) -> io::Result<(FrameHeader, Vec<u8>)> {
        self.stream.write_all(frame)?;
        self.stream.flush()?;

        let mut head = [0u8; FRAME_HEADER_SIZE];
        self.stream.read_exact(&mut head)?;
        let header = FrameHeader::from_bytes(&head)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        let mut payload = vec![0u8; usize::from(header.length)];
        self.stream.read_exact(&mut payload)?;
        Ok((header, payload))
    }
}

impl Transport for TcpTransport {
    fn call(&mut self, request: &Request) -> Result<Reply> {
        let function = request.function();
        trace!(%function, len = request.payload().len(), "native call");

        // An oversized request fails here, before anything is sent.
        let frame = encode_request(function.code(), request.payload())?;
        let (header, payload) = self.exchange(&frame).map_err(map_io_error)?;
        if !header.is_reply() {
            return Err(FocasError::invalid_response("received a request frame"));
        }
        let answered = Function::from_code(header.function)?;
        if answered != function {
            return Err(FocasError::invalid_response(format!(
                "reply for {answered} while waiting for {function}"
            )));
        }

        trace!(%function, status = header.status, len = payload.len(), "native reply");
        Ok(Reply::new(header.status, payload))
    }

    fn close(&mut self) {
        // NotConnected after an earlier shutdown is expected.
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            trace!(peer = %self.peer, error = %e, "shutdown");
        }
    }
}

fn map_io_error(e: io::Error) -> FocasError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => FocasError::Timeout,
        io::ErrorKind::InvalidData => FocasError::invalid_response(e.to_string()),
        _ => FocasError::Io(e),
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("peer", &self.peer)
            .field("local_addr", &self.stream.local_addr().ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::frame::encode_reply;
    use std::net::TcpListener;
    use std::thread;

    /// Accepts one connection, reads one request and answers with `status`
    /// and `payload` for the same function.
    fn serve_once(status: i16, payload: Vec<u8>) -> (u16, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = [0u8; FRAME_HEADER_SIZE];
            stream.read_exact(&mut head).unwrap();
            let header = FrameHeader::from_bytes(&head).unwrap();
            let mut body = vec![0u8; usize::from(header.length)];
            stream.read_exact(&mut body).unwrap();
            let reply = encode_reply(header.function, status, &payload).unwrap();
            stream.write_all(&reply).unwrap();
            body
        });
        (port, handle)
    }

    #[test]
    fn test_call_round_trip() {
        let (port, server) = serve_once(0, vec![0xC0]);
        let mut transport =
            TcpTransport::connect("127.0.0.1", port, Duration::from_secs(2)).unwrap();
        let request = Request::read_pmc_range(
            crate::AddressRange::single(crate::PmcArea::X, crate::DataType::Byte, 7),
        );
        let reply = transport.call(&request).unwrap();
        assert_eq!(reply, Reply::ok(vec![0xC0]));
        transport.close();
        transport.close();
        assert_eq!(server.join().unwrap(), request.payload());
    }

    #[test]
    fn test_call_returns_native_status_as_data() {
        let (port, server) = serve_once(5, Vec::new());
        let mut transport =
            TcpTransport::connect("127.0.0.1", port, Duration::from_secs(2)).unwrap();
        let reply = transport.call(&Request::read_id()).unwrap();
        assert_eq!(reply.status, 5);
        server.join().unwrap();
    }

    #[test]
    fn test_oversized_request_is_rejected_locally() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut transport =
            TcpTransport::connect("127.0.0.1", port, Duration::from_millis(200)).unwrap();

        let range = crate::AddressRange::new(crate::PmcArea::R, crate::DataType::Byte, 0, u16::MAX)
            .unwrap();
        let values = vec![crate::PmcValue::Byte(0); range.len()];
        let request = Request::write_pmc_range(range, &values).unwrap();
        let err = transport.call(&request).unwrap_err();
        assert!(matches!(err, FocasError::InvalidParameter { .. }), "{err}");
        assert_eq!(err.kind(), ErrorKind::InvalidAddress);

        let (mut peer, _) = listener.accept().unwrap();
        peer.set_read_timeout(Some(Duration::from_millis(100))).unwrap();
        let mut buf = [0u8; 1];
        let read = peer.read(&mut buf);
        assert!(
            !matches!(read, Ok(n) if n > 0),
            "request bytes reached the peer"
        );
    }

    #[test]
    fn test_silent_peer_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut transport =
            TcpTransport::connect("127.0.0.1", port, Duration::from_millis(100)).unwrap();
        let err = transport.call(&Request::read_id()).unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err}");
        assert_eq!(err.kind(), ErrorKind::Connection);
        drop(listener);
    }

    #[test]
    fn test_refused_connection() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = TcpTransport::connect("127.0.0.1", port, Duration::from_millis(500)).unwrap_err();
        assert!(matches!(err, FocasError::Connect { .. }));
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[test]
    fn test_transport_debug() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let transport =
            TcpTransport::connect("127.0.0.1", port, Duration::from_millis(100)).unwrap();
        let text = format!("{transport:?}");
        assert!(text.contains("TcpTransport"));
        assert!(text.contains(&port.to_string()));
    }
}
