// Replies from the ZoneMinder API that the client needs to decode.

use serde_derive::Deserialize;
use zmalarm_api::alarm;

// Depending on the version of ZoneMinder, the `status` field is sent
// as a string or as a number.

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum StatusField {
    Text(String),
    Integer(i64),
}

#[derive(Deserialize, Debug)]
pub struct StateReply {
    status: Option<StatusField>,
}

impl From<StateReply> for alarm::State {
    fn from(reply: StateReply) -> Self {
        alarm::State {
            status: reply.status.map(|v| match v {
                StatusField::Text(s) => s,
                StatusField::Integer(n) => n.to_string(),
            }),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct LoginReply {
    pub access_token: Option<String>,
}
