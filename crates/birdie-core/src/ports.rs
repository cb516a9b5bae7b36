//! The set of outbound ports the conversation layer and the pipeline share.
//!
//! [`Backends`] names one concrete adapter per port so services take a
//! single type parameter instead of six. [`Ports`] holds the instances.

use birdie_types::message::OutboundMessage;

use crate::analysis::backend::AnalysisBackend;
use crate::analysis::client::AnalysisClient;
use crate::conversation::session::SessionService;
use crate::media::transcoder::Transcoder;
use crate::messaging::platform::MessagingPlatform;
use crate::repository::session::SessionRepository;
use crate::repository::user::UserRepository;
use crate::storage::object_store::ObjectStore;

pub trait Backends: Send + Sync + 'static {
    type Messaging: MessagingPlatform + 'static;
    type Users: UserRepository + 'static;
    type Sessions: SessionRepository + 'static;
    type Store: ObjectStore + 'static;
    type Transcoder: Transcoder + 'static;
    type Analysis: AnalysisBackend + 'static;
}

pub struct Ports<B: Backends> {
    pub messaging: B::Messaging,
    pub users: B::Users,
    pub sessions: SessionService<B::Sessions>,
    pub store: B::Store,
    pub transcoder: B::Transcoder,
    pub analysis: AnalysisClient<B::Analysis>,
}

impl<B: Backends> Ports<B> {
    /// Send a reply, logging delivery failures.
    ///
    /// Returns whether the platform accepted it. Reply tokens are single
    /// use, so there is nothing to retry.
    pub async fn reply(&self, user_id: &str, reply_token: &str, messages: Vec<OutboundMessage>) -> bool {
        match self.messaging.reply(reply_token, messages).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(user_id, error = %e, "failed to send reply");
                false
            }
        }
    }
}
