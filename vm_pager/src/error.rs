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

use thiserror::Error;

use crate::message::ClientId;

/// Errors that terminate the whole simulation
#[derive(Debug, Error)]
pub enum PagerError {
    #[error("setup failed: {0}")]
    Setup(String),

    #[error("communication failure: {0}")]
    Communication(String),

    #[error("no free registry slot for client {0}")]
    RegistryFull(ClientId),

    #[error("could not write report: {0}")]
    Output(#[from] std::io::Error),
}

/// Reasons a single request gets rejected.
///
/// These never stop the simulation, the client receives a negative grant instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("bad address {address}, page {page} out of range")]
    AddressOutOfRange { address: u32, page: u32 },

    #[error("client {0} is not registered")]
    UnknownClient(ClientId),

    #[error("client {0} already waits for a page")]
    RequestWhileWaiting(ClientId),
}
