//! Flags accepted by transport calls and readiness bits reported by them.

use bitflags::bitflags;

bitflags! {
    /// Flags controlling a single send call.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SendFlags: u8 {
        /// Fail with would-block instead of waiting for capacity.
        const DONTWAIT = 0b01;
        /// Further frames of the same message follow this one.
        const SNDMORE = 0b10;
    }
}

bitflags! {
    /// Flags controlling a single receive call.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RecvFlags: u8 {
        /// Fail with would-block instead of waiting for a frame.
        const DONTWAIT = 0b01;
    }
}

bitflags! {
    /// Readiness bits reported by a transport socket.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Events: u8 {
        /// At least one frame can be received without blocking.
        const POLLIN = 0b01;
        /// At least one frame can be sent without blocking.
        const POLLOUT = 0b10;
    }
}

impl Events {
    /// Returns `true` if a receive call is expected to succeed.
    #[must_use]
    pub fn can_recv(self) -> bool { self.contains(Self::POLLIN) }

    /// Returns `true` if a send call is expected to succeed.
    #[must_use]
    pub fn can_send(self) -> bool { self.contains(Self::POLLOUT) }
}
