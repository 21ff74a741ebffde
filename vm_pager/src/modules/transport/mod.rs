/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::time::Duration;

use crate::{
    message::{ClientId, Message},
    PagerError,
};

mod channel;
pub use channel::{ChannelClientEndpoint, ChannelTransportModule};

/// Coordinator side of the request/grant protocol
pub trait TransportModule {
    /// What a client needs to talk to the coordinator
    type Endpoint: ClientEndpoint;

    /// Creates the endpoint for a newly admitted client
    fn connect(&mut self, client: ClientId) -> Result<Self::Endpoint, PagerError>;

    /// Forgets everything about `client`
    fn disconnect(&mut self, client: ClientId);

    /// Returns the next inbound request without blocking
    fn try_receive(&mut self) -> Result<Option<Message>, PagerError>;

    /// Waits up to `timeout` of real time for the next inbound request
    fn receive_timeout(&mut self, timeout: Duration) -> Result<Option<Message>, PagerError>;

    /// Delivers a grant to `message.client`
    fn send(&mut self, message: Message) -> Result<(), PagerError>;
}

/// Client side of the request/grant protocol
pub trait ClientEndpoint: Send + 'static {
    fn client(&self) -> ClientId;

    /// Sends a request and blocks until the matching grant arrives
    fn request(&mut self, address: u32, is_write: bool) -> Result<Message, PagerError>;
}
