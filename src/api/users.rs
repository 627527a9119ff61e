// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use super::{ApiClient, ApiRequest, ME_PATH};
use crate::error::ClientError;
use crate::models::UserProfile;

impl ApiClient {
    /// Profile of the logged-in user.
    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        self.pipeline().send(ApiRequest::get(ME_PATH)).await?.json()
    }
}
