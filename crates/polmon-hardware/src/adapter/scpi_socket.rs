//! Adapter that talks SCPI to the instrument over a raw TCP socket.
//!
//! # Wire format
//!
//! Commands are ASCII lines terminated by `\n`. Text replies are single lines.
//! Binary replies use IEEE 488.2 definite-length blocks:
//!
//! ```text
//! #<d><len: d ASCII digits><payload: len bytes>\n
//! ```
//!
//! The payload is raw `f32` data and may contain `0x0a` bytes, so the
//! indefinite-length `#0` form is rejected. Declared lengths above
//! [`MAX_BLOCK_BYTES`] are rejected before any buffer is allocated.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::InstrumentError;
use crate::polarimeter::MAX_SAMPLES_PER_SWEEP;
use crate::port::InstrumentPort;

/// Port of the raw SCPI socket service on LAN instruments.
pub const DEFAULT_SCPI_PORT: u16 = 5025;

/// Largest binary block accepted: a full SOP buffer of three `f32` values
/// per sample.
pub const MAX_BLOCK_BYTES: usize = 3 * MAX_SAMPLES_PER_SWEEP * 4;

// ---------------------------------------------------------------------------
// ScpiSocket
// ---------------------------------------------------------------------------

/// Blocking SCPI session over TCP.
pub struct ScpiSocket {
    reader: Option<BufReader<TcpStream>>,
    timeout_ms: u64,
}

impl ScpiSocket {
    /// Connect to `resource`, which is either a VISA-style string
    /// (`TCPIP0::<host>::inst0::INSTR`, `TCPIP0::<host>::<port>::SOCKET`) or
    /// `host[:port]`.
    pub fn connect(
        resource: &str,
        default_port: u16,
        timeout: Duration,
    ) -> Result<Self, InstrumentError> {
        let (host, port) = parse_resource(resource, default_port)?;
        let address = format!("{host}:{port}");
        let connect_err = |source: io::Error| InstrumentError::Connect {
            address: address.clone(),
            source,
        };

        let addr = (host.as_str(), port)
            .to_socket_addrs()
            .map_err(connect_err)?
            .next()
            .ok_or_else(|| InstrumentError::InvalidResource {
                resource: resource.to_owned(),
                reason: format!("{host} did not resolve"),
            })?;

        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(connect_err)?;
        tracing::debug!(%address, "connected to instrument");
        Self::from_stream(stream, timeout).map_err(connect_err)
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream, timeout: Duration) -> io::Result<Self> {
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(Self {
            reader: Some(BufReader::new(stream)),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    fn session(&mut self) -> Result<&mut BufReader<TcpStream>, InstrumentError> {
        self.reader.as_mut().ok_or(InstrumentError::Closed)
    }

    fn send(&mut self, command: &str) -> Result<(), InstrumentError> {
        let timeout_ms = self.timeout_ms;
        let stream = self.session()?.get_mut();
        stream
            .write_all(command.as_bytes())
            .and_then(|()| stream.write_all(b"\n"))
            .and_then(|()| stream.flush())
            .map_err(|e| InstrumentError::from_io(command, e, timeout_ms))
    }
}

impl InstrumentPort for ScpiSocket {
    fn write(&mut self, command: &str) -> Result<(), InstrumentError> {
        self.send(command)
    }

    fn query(&mut self, command: &str) -> Result<String, InstrumentError> {
        self.send(command)?;
        let timeout_ms = self.timeout_ms;
        read_reply_line(self.session()?, command, timeout_ms)
    }

    fn query_binary(&mut self, command: &str) -> Result<Vec<u8>, InstrumentError> {
        self.send(command)?;
        let timeout_ms = self.timeout_ms;
        read_block(self.session()?, command, timeout_ms)
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        match self.reader.take() {
            Some(reader) => reader
                .into_inner()
                .shutdown(std::net::Shutdown::Both)
                .or_else(|e| match e.kind() {
                    io::ErrorKind::NotConnected => Ok(()),
                    _ => Err(e),
                })
                .map_err(|e| InstrumentError::from_io("close", e, self.timeout_ms)),
            None => Err(InstrumentError::Closed),
        }
    }
}

// ---------------------------------------------------------------------------
// Resource strings
// ---------------------------------------------------------------------------

/// Split a resource string into host and port.
pub fn parse_resource(resource: &str, default_port: u16) -> Result<(String, u16), InstrumentError> {
    let invalid = |reason: &str| InstrumentError::InvalidResource {
        resource: resource.to_owned(),
        reason: reason.to_owned(),
    };

    let trimmed = resource.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty resource"));
    }

    if trimmed.contains("::") {
        let parts: Vec<&str> = trimmed.split("::").collect();
        if !parts[0].to_ascii_uppercase().starts_with("TCPIP") {
            return Err(invalid("only TCPIP resources are supported"));
        }
        let host = parts.get(1).filter(|h| !h.is_empty()).ok_or_else(|| invalid("missing host"))?;
        let is_socket = parts
            .last()
            .is_some_and(|p| p.eq_ignore_ascii_case("SOCKET"));
        let port = match (is_socket, parts.get(2)) {
            (true, Some(p)) => p.parse().map_err(|_| invalid("invalid socket port"))?,
            _ => default_port,
        };
        return Ok(((*host).to_owned(), port));
    }

    match trimmed.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port.parse().map_err(|_| invalid("invalid port"))?;
            Ok((host.to_owned(), port))
        }
        Some(_) => Err(invalid("missing host")),
        None => Ok((trimmed.to_owned(), default_port)),
    }
}

// ---------------------------------------------------------------------------
// Reply parsing
// ---------------------------------------------------------------------------

/// Read one newline-terminated text reply, without the terminator.
pub(crate) fn read_reply_line<R: BufRead>(
    reader: &mut R,
    command: &str,
    timeout_ms: u64,
) -> Result<String, InstrumentError> {
    let mut line = String::new();
    let n = reader
        .read_line(&mut line)
        .map_err(|e| InstrumentError::from_io(command, e, timeout_ms))?;
    if n == 0 {
        return Err(InstrumentError::malformed(command, "connection closed before reply"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// Read one IEEE 488.2 binary block and its terminator.
pub(crate) fn read_block<R: BufRead>(
    reader: &mut R,
    command: &str,
    timeout_ms: u64,
) -> Result<Vec<u8>, InstrumentError> {
    let io_err = |e: io::Error| InstrumentError::from_io(command, e, timeout_ms);

    let mut header = [0u8; 2];
    reader.read_exact(&mut header).map_err(io_err)?;
    if header[0] != b'#' {
        return Err(InstrumentError::malformed(
            command,
            format!("expected block header '#', got 0x{:02x}", header[0]),
        ));
    }
    let digits = match header[1] {
        d @ b'0'..=b'9' => usize::from(d - b'0'),
        other => {
            return Err(InstrumentError::malformed(
                command,
                format!("invalid block length digit 0x{other:02x}"),
            ))
        }
    };

    if digits == 0 {
        return Err(InstrumentError::malformed(
            command,
            "indefinite-length block not supported for binary data",
        ));
    }

    let mut len_field = vec![0u8; digits];
    reader.read_exact(&mut len_field).map_err(io_err)?;
    let len: usize = std::str::from_utf8(&len_field)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| InstrumentError::malformed(command, "non-numeric block length"))?;
    if len > MAX_BLOCK_BYTES {
        return Err(InstrumentError::malformed(
            command,
            format!("block length {len} exceeds {MAX_BLOCK_BYTES} bytes"),
        ));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).map_err(io_err)?;

    // Consume the message terminator (`\n` or `\r\n`).
    let mut term = [0u8; 1];
    reader.read_exact(&mut term).map_err(io_err)?;
    if term[0] == b'\r' {
        reader.read_exact(&mut term).map_err(io_err)?;
    }
    if term[0] != b'\n' {
        return Err(InstrumentError::malformed(
            command,
            format!("expected block terminator, got 0x{:02x}", term[0]),
        ));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::thread;

    fn block(payload: &[u8]) -> Vec<u8> {
        let len = payload.len().to_string();
        let mut buf = format!("#{}{}", len.len(), len).into_bytes();
        buf.extend_from_slice(payload);
        buf.push(b'\n');
        buf
    }

    #[test]
    fn test_parse_visa_resource() {
        let (host, port) = parse_resource("TCPIP0::100.65.27.149::inst0::INSTR", 5025).unwrap();
        assert_eq!(host, "100.65.27.149");
        assert_eq!(port, 5025);

        let (host, port) = parse_resource("TCPIP::10.0.0.2::5000::SOCKET", 5025).unwrap();
        assert_eq!(host, "10.0.0.2");
        assert_eq!(port, 5000);
    }

    #[test]
    fn test_parse_plain_resource() {
        assert_eq!(parse_resource("localhost:7000", 5025).unwrap(), ("localhost".into(), 7000));
        assert_eq!(parse_resource("polarimeter", 5025).unwrap(), ("polarimeter".into(), 5025));
        assert!(parse_resource("GPIB0::7::INSTR", 5025).is_err());
        assert!(parse_resource("", 5025).is_err());
    }

    #[test]
    fn test_read_definite_block() {
        let payload = [1u8, 2, 3, b'\n', 5, 6, 7, 8, 9, 10, 11, 12];
        let mut cursor = Cursor::new(block(&payload));
        let got = read_block(&mut cursor, "GET?", 1000).unwrap();
        assert_eq!(got, payload);
        assert_eq!(cursor.position() as usize, cursor.get_ref().len());
    }

    #[test]
    fn test_block_rejects_indefinite_length() {
        let mut cursor = Cursor::new(b"#0\x00\x00\x80\x3f\n".to_vec());
        let result = read_block(&mut cursor, "GET?", 1000);
        assert!(matches!(result, Err(InstrumentError::MalformedResponse { .. })));
    }

    #[test]
    fn test_block_rejects_oversized_length() {
        let mut cursor = Cursor::new(b"#9999999999\n".to_vec());
        let result = read_block(&mut cursor, "GET?", 1000);
        assert!(matches!(result, Err(InstrumentError::MalformedResponse { .. })));

        let at_limit = format!("#8{MAX_BLOCK_BYTES}");
        let mut cursor = Cursor::new(at_limit.into_bytes());
        let result = read_block(&mut cursor, "GET?", 1000);
        assert!(matches!(result, Err(InstrumentError::Io { .. })));
    }

    #[test]
    fn test_block_rejects_bad_header() {
        let mut cursor = Cursor::new(b"1.0,2.0\n".to_vec());
        let result = read_block(&mut cursor, "GET?", 1000);
        assert!(matches!(result, Err(InstrumentError::MalformedResponse { .. })));
    }

    #[test]
    fn test_block_truncated_payload_is_io_error() {
        let mut cursor = Cursor::new(b"#212abc".to_vec());
        let result = read_block(&mut cursor, "GET?", 1000);
        assert!(matches!(result, Err(InstrumentError::Io { .. })));
    }

    #[test]
    fn test_reply_line_strips_terminator() {
        let mut cursor = Cursor::new(b"READY,DATA_AVAILABLE\r\n".to_vec());
        assert_eq!(read_reply_line(&mut cursor, "STAT?", 1000).unwrap(), "READY,DATA_AVAILABLE");
        let result = read_reply_line(&mut cursor, "STAT?", 1000);
        assert!(matches!(result, Err(InstrumentError::MalformedResponse { .. })));
    }

    #[test]
    fn test_loopback_session() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let mut line = String::new();

            reader.read_line(&mut line).unwrap();
            assert_eq!(line, "*IDN?\n");
            writer.write_all(b"Keysight,N7788C,0,1.0\n").unwrap();

            line.clear();
            reader.read_line(&mut line).unwrap();
            assert_eq!(line, ":POLarimeter:FUNCtion:RESult?\n");
            writer.write_all(&block(&1.5f32.to_le_bytes())).unwrap();

            line.clear();
            reader.read_line(&mut line).unwrap();
            assert_eq!(line, ":POLarimeter:GAIN 8\n");
        });

        let mut socket =
            ScpiSocket::connect(&addr.to_string(), DEFAULT_SCPI_PORT, Duration::from_secs(2)).unwrap();
        assert_eq!(socket.query("*IDN?").unwrap(), "Keysight,N7788C,0,1.0");
        assert_eq!(
            socket.query_binary(":POLarimeter:FUNCtion:RESult?").unwrap(),
            1.5f32.to_le_bytes()
        );
        socket.configure(":POLarimeter:GAIN", "8").unwrap();

        server.join().unwrap();
        socket.close().unwrap();
        assert!(matches!(socket.query("*IDN?"), Err(InstrumentError::Closed)));
    }
}
