//! Socket types and compile-time socket roles.
//!
//! [`SocketType`] is the runtime description used by the type-erased
//! [`AsyncSocket`](crate::AsyncSocket). The [`role`] module provides one
//! marker type per socket type so [`TypedSocket`](crate::TypedSocket) can
//! reject unsupported operations at compile time instead of at runtime.

use std::fmt;

use serde::Deserialize;

/// Messaging pattern implemented by a socket.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocketType {
    /// Exclusive one-to-one pair.
    Pair,
    /// Publisher of a pub/sub topic tree.
    Pub,
    /// Subscriber of a pub/sub topic tree.
    Sub,
    /// Requesting side of a strict request/reply exchange.
    Req,
    /// Replying side of a strict request/reply exchange.
    Rep,
    /// Asynchronous request side, load balancing outbound messages.
    Dealer,
    /// Asynchronous reply side, addressing peers by routing id.
    Router,
    /// Upstream end of a pipeline.
    Pull,
    /// Downstream end of a pipeline.
    Push,
    /// Raw publisher exposing subscriptions.
    XPub,
    /// Raw subscriber forwarding subscriptions.
    XSub,
    /// Thread-safe server socket (draft).
    Server,
    /// Thread-safe client socket (draft).
    Client,
    /// Thread-safe radio socket (draft).
    Radio,
    /// Thread-safe dish socket (draft).
    Dish,
    /// Thread-safe scatter socket (draft).
    Scatter,
    /// Thread-safe gather socket (draft).
    Gather,
    /// Thread-safe peer socket (draft).
    Peer,
}

impl SocketType {
    /// Returns `true` if the socket exposes a pollable descriptor.
    ///
    /// Thread-safe draft sockets cannot hand out a descriptor, so they have
    /// no asynchronous support.
    #[must_use]
    pub const fn supports_descriptor(self) -> bool {
        !matches!(
            self,
            Self::Server
                | Self::Client
                | Self::Radio
                | Self::Dish
                | Self::Scatter
                | Self::Gather
                | Self::Peer
        )
    }

    /// Returns `true` if the socket carries multipart messages.
    #[must_use]
    pub const fn supports_multipart(self) -> bool { self.supports_descriptor() }

    /// Returns `true` if the socket may send.
    #[must_use]
    pub const fn can_send(self) -> bool { !matches!(self, Self::Pull | Self::Sub) }

    /// Returns `true` if the socket may receive.
    #[must_use]
    pub const fn can_recv(self) -> bool { !matches!(self, Self::Push | Self::Pub) }

    /// Numeric type code reported by the `Type` option.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Pair => 0,
            Self::Pub => 1,
            Self::Sub => 2,
            Self::Req => 3,
            Self::Rep => 4,
            Self::Dealer => 5,
            Self::Router => 6,
            Self::Pull => 7,
            Self::Push => 8,
            Self::XPub => 9,
            Self::XSub => 10,
            Self::Server => 12,
            Self::Client => 13,
            Self::Radio => 14,
            Self::Dish => 15,
            Self::Gather => 16,
            Self::Scatter => 17,
            Self::Peer => 19,
        }
    }

    /// Lowercase name of the socket type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pair => "pair",
            Self::Pub => "pub",
            Self::Sub => "sub",
            Self::Req => "req",
            Self::Rep => "rep",
            Self::Dealer => "dealer",
            Self::Router => "router",
            Self::Pull => "pull",
            Self::Push => "push",
            Self::XPub => "xpub",
            Self::XSub => "xsub",
            Self::Server => "server",
            Self::Client => "client",
            Self::Radio => "radio",
            Self::Dish => "dish",
            Self::Scatter => "scatter",
            Self::Gather => "gather",
            Self::Peer => "peer",
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Compile-time socket roles.
pub mod role {
    use super::SocketType;
    use crate::sealed::Sealed;

    /// A socket type known at compile time.
    pub trait Role: Sealed + Send + Sync + 'static {
        /// Runtime description of the role.
        const TYPE: SocketType;
    }

    /// Roles whose sockets expose a pollable descriptor.
    pub trait AsyncRole: Role {}

    /// Roles whose sockets carry multipart messages.
    pub trait MultipartRole: AsyncRole {}

    macro_rules! roles {
        ($($(#[$doc:meta])* $name:ident => $ty:ident: $($cap:ident),*;)*) => {$(
            $(#[$doc])*
            #[derive(Clone, Copy, Debug, Default)]
            pub struct $name;

            impl Sealed for $name {}

            impl Role for $name {
                const TYPE: SocketType = SocketType::$ty;
            }

            $(impl $cap for $name {})*
        )*};
    }

    roles! {
        /// `PAIR` role.
        Pair => Pair: AsyncRole, MultipartRole;
        /// `PUB` role.
        Pub => Pub: AsyncRole, MultipartRole;
        /// `SUB` role.
        Sub => Sub: AsyncRole, MultipartRole;
        /// `REQ` role.
        Req => Req: AsyncRole, MultipartRole;
        /// `REP` role.
        Rep => Rep: AsyncRole, MultipartRole;
        /// `DEALER` role.
        Dealer => Dealer: AsyncRole, MultipartRole;
        /// `ROUTER` role.
        Router => Router: AsyncRole, MultipartRole;
        /// `PULL` role.
        Pull => Pull: AsyncRole, MultipartRole;
        /// `PUSH` role.
        Push => Push: AsyncRole, MultipartRole;
        /// `XPUB` role.
        XPub => XPub: AsyncRole, MultipartRole;
        /// `XSUB` role.
        XSub => XSub: AsyncRole, MultipartRole;
        /// `SERVER` role; no descriptor, hence no asynchronous support.
        Server => Server: ;
        /// `CLIENT` role; no descriptor, hence no asynchronous support.
        Client => Client: ;
        /// `RADIO` role; no descriptor, hence no asynchronous support.
        Radio => Radio: ;
        /// `DISH` role; no descriptor, hence no asynchronous support.
        Dish => Dish: ;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        SocketType,
        role::{self, Role},
    };

    #[rstest]
    #[case(SocketType::Router, true)]
    #[case(SocketType::Dealer, true)]
    #[case(SocketType::Server, false)]
    #[case(SocketType::Radio, false)]
    fn descriptor_support_matches_type(#[case] ty: SocketType, #[case] expected: bool) {
        assert_eq!(ty.supports_descriptor(), expected);
        assert_eq!(ty.supports_multipart(), expected);
    }

    #[test]
    fn roles_map_to_runtime_types() {
        assert_eq!(role::Dealer::TYPE, SocketType::Dealer);
        assert_eq!(role::Client::TYPE, SocketType::Client);
    }

    #[test]
    fn socket_types_display_lowercase() {
        assert_eq!(SocketType::XPub.to_string(), "xpub");
    }
}
