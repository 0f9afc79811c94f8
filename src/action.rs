use crate::{
    name::Name,
    serialization::{eos_struct_codec, EosSerialize},
};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// `actor@permission` pair authorizing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

eos_struct_codec!(PermissionLevel { actor, permission });

impl PermissionLevel {
    pub fn new(actor: Name, permission: Name) -> Self {
        PermissionLevel { actor, permission }
    }

    /// `actor@active`
    pub fn active(actor: Name) -> Self {
        PermissionLevel::new(actor, Name::ACTIVE)
    }
}

/// Single contract call. `data` holds the packed payload, hex encoded in JSON.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub account: Name,
    pub name: Name,
    pub authorization: Vec<PermissionLevel>,
    #[serde_as(as = "Hex")]
    pub data: Vec<u8>,
}

eos_struct_codec!(Action {
    account,
    name,
    authorization,
    data
});

impl Action {
    pub fn new<T: EosSerialize>(
        account: Name,
        name: Name,
        authorization: Vec<PermissionLevel>,
        payload: &T,
    ) -> Self {
        Action {
            account,
            name,
            authorization,
            data: payload.pack(),
        }
    }
}
