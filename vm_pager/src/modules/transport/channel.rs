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

use std::{collections::HashMap, time::Duration};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::trace;

use crate::{
    message::{ClientId, Message, MessageKind},
    PagerError,
};

use super::{ClientEndpoint, TransportModule};

/// Transport based on in process channels.
///
/// All clients share one request channel, every client has its own grant channel.
pub struct ChannelTransportModule {
    request_sender: Sender<Message>,
    request_receiver: Receiver<Message>,
    grant_senders: HashMap<ClientId, Sender<Message>>,
}

impl ChannelTransportModule {
    pub fn new() -> Self {
        let (request_sender, request_receiver) = unbounded();
        Self {
            request_sender,
            request_receiver,
            grant_senders: HashMap::new(),
        }
    }
}

impl Default for ChannelTransportModule {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportModule for ChannelTransportModule {
    type Endpoint = ChannelClientEndpoint;

    fn connect(&mut self, client: ClientId) -> Result<Self::Endpoint, PagerError> {
        let (grant_sender, grant_receiver) = unbounded();
        if self.grant_senders.insert(client, grant_sender).is_some() {
            return Err(PagerError::Communication(format!(
                "client {} is already connected",
                client
            )));
        }

        Ok(ChannelClientEndpoint {
            client,
            requests: self.request_sender.clone(),
            grants: grant_receiver,
        })
    }

    fn disconnect(&mut self, client: ClientId) {
        // dropping the sender wakes up the client if it still waits
        self.grant_senders.remove(&client);
    }

    // request_sender is kept alive here, so the channel can only ever be empty
    fn try_receive(&mut self) -> Result<Option<Message>, PagerError> {
        let message = self.request_receiver.try_recv().ok();
        if let Some(message) = &message {
            trace!("Received {:?}", message);
        }
        Ok(message)
    }

    fn receive_timeout(&mut self, timeout: Duration) -> Result<Option<Message>, PagerError> {
        let message = self.request_receiver.recv_timeout(timeout).ok();
        if let Some(message) = &message {
            trace!("Received {:?}", message);
        }
        Ok(message)
    }

    fn send(&mut self, message: Message) -> Result<(), PagerError> {
        let sender = self.grant_senders.get(&message.client).ok_or_else(|| {
            PagerError::Communication(format!("client {} is not connected", message.client))
        })?;

        sender.send(message).map_err(|_| {
            PagerError::Communication(format!("grant to client {} failed", message.client))
        })
    }
}

pub struct ChannelClientEndpoint {
    client: ClientId,
    requests: Sender<Message>,
    grants: Receiver<Message>,
}

impl ClientEndpoint for ChannelClientEndpoint {
    fn client(&self) -> ClientId {
        self.client
    }

    fn request(&mut self, address: u32, is_write: bool) -> Result<Message, PagerError> {
        self.requests
            .send(Message::request(self.client, address, is_write))
            .map_err(|_| PagerError::Communication("coordinator is gone".to_string()))?;

        let reply = self
            .grants
            .recv()
            .map_err(|_| PagerError::Communication("grant channel closed".to_string()))?;
        debug_assert_eq!(reply.kind, MessageKind::Grant);
        debug_assert_eq!(reply.client, self.client);

        Ok(reply)
    }
}
