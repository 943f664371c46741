//! Syslog sink
//!
//! Messages are formatted the way the local `syslog(3)` does for `/dev/log`
//! (RFC 3164 without a hostname): `<PRI>Mmm dd hh:mm:ss tag[pid]: message`.

use crate::core::{DiagError, Facility, Priority, Result};
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::net::{ToSocketAddrs, UdpSocket};
use std::sync::Arc;

#[cfg(unix)]
use std::{os::unix::net::UnixDatagram, path::Path};

/// Local syslog sockets, tried in order
pub const DEFAULT_SOCKET_PATHS: [&str; 3] = ["/dev/log", "/var/run/syslog", "/var/run/log"];

const MAX_TAG_LEN: usize = 32;

/// Operations all transport layers must support.
pub trait SyslogTransport: Send + Sync {
    /// Send one complete datagram
    fn send(&self, buf: &[u8]) -> Result<usize>;
}

/// Sending syslog messages via UDP datagrams.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<UdpTransport> {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .map_err(|e| DiagError::io_operation("binding syslog UDP socket", e))?;
        socket
            .connect(addr)
            .map_err(|e| DiagError::io_operation("connecting syslog UDP socket", e))?;
        Ok(UdpTransport { socket })
    }

    /// localhost:514
    pub fn local() -> Result<UdpTransport> {
        UdpTransport::new("localhost:514")
    }
}

impl SyslogTransport for UdpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket
            .send(buf)
            .map_err(|e| DiagError::io_operation("sending syslog datagram", e))
    }
}

/// Sending syslog messages via a Unix datagram socket.
#[cfg(unix)]
#[derive(Debug)]
pub struct UnixSocketTransport {
    socket: UnixDatagram,
}

#[cfg(unix)]
impl UnixSocketTransport {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<UnixSocketTransport> {
        let socket = UnixDatagram::unbound()
            .map_err(|e| DiagError::io_operation("creating syslog socket", e))?;
        socket
            .connect(path)
            .map_err(|e| DiagError::io_operation("connecting to syslog socket", e))?;
        Ok(UnixSocketTransport { socket })
    }

    /// First of [`DEFAULT_SOCKET_PATHS`] that accepts a connection
    pub fn try_default() -> Result<UnixSocketTransport> {
        DEFAULT_SOCKET_PATHS
            .iter()
            .find_map(|p| UnixSocketTransport::new(p).ok())
            .ok_or_else(|| {
                DiagError::syslog_unavailable(format!(
                    "no local syslog socket at {}",
                    DEFAULT_SOCKET_PATHS.join(", ")
                ))
            })
    }
}

#[cfg(unix)]
impl SyslogTransport for UnixSocketTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket
            .send(buf)
            .map_err(|e| DiagError::io_operation("sending syslog datagram", e))
    }
}

/// Keeps every datagram in memory. Clones share the same buffer, and the
/// transport doubles as a connector handing out such clones.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    datagrams: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.datagrams
            .lock()
            .iter()
            .map(|d| String::from_utf8_lossy(d).into_owned())
            .collect()
    }
}

impl SyslogTransport for MemoryTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.datagrams.lock().push(buf.to_vec());
        Ok(buf.len())
    }
}

/// Opens a transport when the syslog sink is first configured.
pub trait SyslogConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn SyslogTransport>>;
}

/// Connects to the local syslog daemon.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalSyslogConnector;

impl SyslogConnector for LocalSyslogConnector {
    #[cfg(unix)]
    fn connect(&self) -> Result<Box<dyn SyslogTransport>> {
        Ok(Box::new(UnixSocketTransport::try_default()?))
    }

    #[cfg(not(unix))]
    fn connect(&self) -> Result<Box<dyn SyslogTransport>> {
        Ok(Box::new(UdpTransport::local()?))
    }
}

impl SyslogConnector for MemoryTransport {
    fn connect(&self) -> Result<Box<dyn SyslogTransport>> {
        Ok(Box::new(self.clone()))
    }
}

/// An open syslog sink: a transport bound to a facility and tag.
pub struct SyslogWriter {
    transport: Box<dyn SyslogTransport>,
    facility: Facility,
    tag: String,
    pid: u32,
}

impl SyslogWriter {
    /// Looks `facility` up in the facility table and connects.
    pub fn open(
        connector: &dyn SyslogConnector,
        facility: &str,
        tag: &str,
        pid: u32,
    ) -> Result<SyslogWriter> {
        let facility =
            Facility::from_name(facility).ok_or_else(|| DiagError::unknown_facility(facility))?;
        let transport = connector.connect()?;
        Ok(SyslogWriter {
            transport,
            facility,
            tag: tag.chars().take(MAX_TAG_LEN).collect(),
            pid,
        })
    }

    pub fn facility(&self) -> Facility {
        self.facility
    }

    pub fn send(&self, priority: Priority, msg: &str) -> Result<()> {
        let datagram = self.format_datagram(priority, msg, Local::now());
        self.transport.send(&datagram)?;
        Ok(())
    }

    pub fn format_datagram(&self, priority: Priority, msg: &str, at: DateTime<Local>) -> Vec<u8> {
        format!(
            "<{}>{} {}[{}]: {}",
            self.facility.pri(priority),
            at.format("%b %e %H:%M:%S"),
            self.tag,
            self.pid,
            msg
        )
        .into_bytes()
    }
}

impl std::fmt::Debug for SyslogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyslogWriter")
            .field("facility", &self.facility)
            .field("tag", &self.tag)
            .field("pid", &self.pid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_open_unknown_facility() {
        let transport = MemoryTransport::new();
        let err = SyslogWriter::open(&transport, "nonesuch", "prog", 1).unwrap_err();
        assert!(matches!(err, DiagError::UnknownFacility(_)));
    }

    #[test]
    fn test_datagram_format() {
        let transport = MemoryTransport::new();
        let writer = SyslogWriter::open(&transport, "Daemon", "mydaemon", 4242).unwrap();
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();

        let datagram = writer.format_datagram(Priority::Err, "disk on fire", at);
        assert_eq!(
            String::from_utf8(datagram).unwrap(),
            "<27>Mar  7 09:05:01 mydaemon[4242]: disk on fire"
        );
    }

    #[test]
    fn test_send_reaches_transport() {
        let transport = MemoryTransport::new();
        let writer = SyslogWriter::open(&transport, "local0", "prog", 9).unwrap();

        writer.send(Priority::Info, "hello").unwrap();

        let messages = transport.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("<134>"));
        assert!(messages[0].ends_with("prog[9]: hello"));
    }

    #[test]
    fn test_tag_is_truncated() {
        let transport = MemoryTransport::new();
        let long = "x".repeat(64);
        let writer = SyslogWriter::open(&transport, "user", &long, 1).unwrap();
        writer.send(Priority::Debug, "m").unwrap();
        assert!(transport.messages()[0].contains(&format!(" {}[1]: ", "x".repeat(32))));
    }
}
