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

use core::fmt;

use crate::pager_config::{PAGE_COUNT, PAGE_SIZE};

pub type FrameIndex = usize;
pub type PageNumber = usize;

/// External identifier of a client, assigned on admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Grant,
}

/// Fixed size record exchanged between clients and the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub client: ClientId,
    pub address: u32,
    pub is_write: bool,
    pub granted: bool,
}

impl Message {
    pub fn request(client: ClientId, address: u32, is_write: bool) -> Self {
        Self {
            kind: MessageKind::Request,
            client,
            address,
            is_write,
            granted: false,
        }
    }

    /// Positive answer to `request`
    pub fn grant(request: &Message) -> Self {
        Self {
            kind: MessageKind::Grant,
            granted: true,
            ..*request
        }
    }

    /// Negative answer to `request`, the request was rejected
    pub fn reject(request: &Message) -> Self {
        Self {
            kind: MessageKind::Grant,
            granted: false,
            ..*request
        }
    }

    /// Page that `address` falls into.
    ///
    /// Returns `Err` with the out of range page number if the address is outside the address space.
    pub fn page(&self) -> Result<PageNumber, u32> {
        let page = self.address / PAGE_SIZE;
        if (page as usize) < PAGE_COUNT {
            Ok(page as PageNumber)
        } else {
            Err(page)
        }
    }
}
