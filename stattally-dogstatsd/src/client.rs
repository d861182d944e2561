// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    fmt, io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    sync::{Arc, Mutex, RwLock, Weak},
    time::{Duration, Instant},
};

use stattally_core::Stat;
use tokio::{runtime::Handle, time::MissedTickBehavior};

use crate::{
    line::{MetricType, write_line},
    rate_limit::SendErrorLimiter,
};

/// Default agent address
pub const DEFAULT_ADDRESS: &str = "localhost:8125";
/// Default interval between sends of partially filled datagrams
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);
/// Default maximum datagram size, in bytes
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1 << 15;

const SEND_ERROR_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for [`DogStatsd::connect`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DogStatsdConfig {
    /// Agent address, `host:port`
    pub address: String,
    /// Interval between sends of partially filled datagrams. Must not be zero.
    pub flush_interval: Duration,
    /// Tags attached to every event
    pub tags: Vec<String>,
    /// Upper bound on the size of a datagram. A single line longer than this is sent on its own.
    pub max_packet_size: usize,
}

impl Default for DogStatsdConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            tags: vec![],
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

/// DogStatsD client over UDP.
///
/// Cloning is cheap and clones share the socket, the pending datagram and the static tags.
#[derive(Clone)]
pub struct DogStatsd {
    inner: Arc<Inner>,
}

struct Inner {
    socket: UdpSocket,
    max_packet_size: usize,
    static_tags: RwLock<Vec<String>>,
    packet: Mutex<Packet>,
    send_errors: SendErrorLimiter,
}

#[derive(Default)]
struct Packet {
    datagram: String,
    // scratch space for encoding one line
    line: String,
}

impl fmt::Debug for DogStatsd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DogStatsd")
            .field("peer", &self.inner.socket.peer_addr().ok())
            .field("max_packet_size", &self.inner.max_packet_size)
            .finish()
    }
}

impl DogStatsd {
    /// Resolve `config.address` and open a UDP socket to it.
    ///
    /// If called within a tokio runtime, a task on that runtime sends partially filled datagrams
    /// every `config.flush_interval` for as long as a handle to this client exists. Otherwise
    /// they are only sent by [`DogStatsd::flush`] and when the client is dropped.
    ///
    /// # Errors
    ///
    /// Fails if the address does not resolve, if the socket can't be opened, or if
    /// `config.flush_interval` is zero.
    pub fn connect(config: DogStatsdConfig) -> io::Result<Self> {
        if config.flush_interval.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "flush interval must not be zero",
            ));
        }
        let peer = config.address.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("address {:?} did not resolve", config.address),
            )
        })?;
        let local: SocketAddr = match peer {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(peer)?;
        // a full socket buffer drops the datagram instead of stalling the caller
        socket.set_nonblocking(true)?;

        let inner = Arc::new(Inner {
            socket,
            max_packet_size: config.max_packet_size,
            static_tags: RwLock::new(config.tags),
            packet: Mutex::new(Packet::default()),
            send_errors: SendErrorLimiter::new(SEND_ERROR_REPORT_INTERVAL),
        });

        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(flush_periodically(
                    Arc::downgrade(&inner),
                    config.flush_interval,
                ));
            }
            Err(_) => tracing::debug!(
                %peer,
                "no tokio runtime, partial datagrams are only sent on explicit flush"
            ),
        }
        tracing::debug!(%peer, "connected dogstatsd client");

        Ok(Self { inner })
    }

    /// Send the pending datagram, if any.
    pub fn flush(&self) {
        self.inner.flush();
    }

    fn write(&self, name: &str, value: f64, metric_type: MetricType, tags: &[&str]) {
        if !value.is_finite() {
            tracing::debug!(name, value, "dropping non-finite stat value");
            return;
        }
        self.inner.write(name, value, metric_type, tags);
    }
}

async fn flush_periodically(inner: Weak<Inner>, flush_interval: Duration) {
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.flush();
    }
}

impl Inner {
    fn write(&self, name: &str, value: f64, metric_type: MetricType, tags: &[&str]) {
        let mut packet = self.packet.lock().unwrap();
        let Packet { datagram, line } = &mut *packet;

        line.clear();
        write_line(
            line,
            name,
            value,
            metric_type,
            tags,
            &self.static_tags.read().unwrap(),
        );

        if !datagram.is_empty() && datagram.len() + 1 + line.len() > self.max_packet_size {
            self.send(datagram);
            datagram.clear();
        }
        if datagram.is_empty() && line.len() >= self.max_packet_size {
            self.send(line);
            return;
        }
        if !datagram.is_empty() {
            datagram.push('\n');
        }
        datagram.push_str(line);
    }

    fn flush(&self) {
        let mut packet = self.packet.lock().unwrap();
        if !packet.datagram.is_empty() {
            self.send(&packet.datagram);
            packet.datagram.clear();
        }
    }

    fn send(&self, datagram: &str) {
        if let Err(err) = self.socket.send(datagram.as_bytes())
            && let Some(suppressed) = self.send_errors.record(err.kind(), Instant::now())
        {
            tracing::error!(
                %err,
                suppressed,
                "failed to send dogstatsd datagram, stats are being dropped"
            );
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.flush();
    }
}

impl Stat for DogStatsd {
    fn count(&self, stat: &str, count: f64, tags: &[&str]) {
        self.write(stat, count, MetricType::Count, tags);
    }

    fn gauge(&self, stat: &str, value: f64, tags: &[&str]) {
        self.write(stat, value, MetricType::Gauge, tags);
    }

    fn histogram(&self, stat: &str, value: f64, tags: &[&str]) {
        self.write(stat, value, MetricType::Histogram, tags);
    }

    fn timing(&self, stat: &str, duration: Duration, tags: &[&str]) {
        self.write(
            stat,
            duration.as_secs_f64() * 1000.0,
            MetricType::Timing,
            tags,
        );
    }

    fn add_tags(&self, tags: &[&str]) {
        self.inner
            .static_tags
            .write()
            .unwrap()
            .extend(tags.iter().map(|t| t.to_string()));
    }

    fn get_tags(&self) -> Vec<String> {
        self.inner.static_tags.read().unwrap().clone()
    }
}
