//! HTTP adapter for instance registration, session lifecycle and mirror reads.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ChatListResponse, ConnectResponse, ContactSearchResponse, CreateGroupRequest,
    CreateGroupResponse, GroupParticipantsRequest, InstanceInfoResponse, InstanceListResponse,
    InstanceRecordResponse, LogoutResponse, MessageListResponse, PairRequest, PairResponse,
    RegisterInstanceRequest, StatusResponse,
};
pub use routes::instance_routes;
