//! The byte-channel abstraction an endpoint runs its protocol over.
//!
//! A [`Transport`] is anything that behaves like a connected, non-blocking
//! duplex socket: `std::net::TcpStream` is the production case, but a
//! `std::os::unix::net::UnixStream` pair (or any other `AsRawFd` duplex) works
//! equally well, which is what lets `hostspec` accept an already-connected
//! channel or a factory for one (see [`crate::hostspec::HostSpec`]).
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;

pub trait Transport: Read + Write + AsRawFd + Send {}

impl<T> Transport for T where T: Read + Write + AsRawFd + Send {}
