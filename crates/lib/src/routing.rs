//! Event routing: classify each inbound webhook event and run the matching reply rule.
//!
//! Text asking what to eat gets a random canned answer; a shared location gets a
//! random open food place nearby. Everything else is logged and left unanswered.
//! Each event is handled on its own: a failure is logged and the batch moves on.

use crate::answers::{CannedAnswers, Dice};
use crate::channels::{EventType, InboundEvent, LineError, LocationMessage, Message, ReplySender};
use crate::places::{LatLng, NearbyQuery, NearbySearch, PlacesError};
use crate::rules;
use std::sync::Arc;

/// Search filters and the empty-result reply.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub place_type: String,
    pub language: String,
    /// Sent when nothing is open nearby; empty means stay silent.
    pub empty_reply: String,
}

impl From<&crate::config::PlacesConfig> for RouterSettings {
    fn from(places: &crate::config::PlacesConfig) -> Self {
        Self {
            place_type: places.place_type.clone(),
            language: places.language.clone(),
            empty_reply: places.empty_reply.clone(),
        }
    }
}

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A reply with this text was sent.
    Replied(String),
    /// A rule ran but decided not to reply.
    Silent,
    /// No rule applies to this event.
    Ignored,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("event has no reply token")]
    MissingReplyToken,
    #[error("reply failed: {0}")]
    Reply(#[from] LineError),
    #[error("nearby search failed: {0}")]
    Search(#[from] PlacesError),
}

/// Per-batch tally, logged once per webhook call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub replied: usize,
    pub silent: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// Routes events to reply rules. Shared across requests; holds no mutable state beyond the dice.
pub struct EventRouter {
    replies: Arc<dyn ReplySender>,
    places: Arc<dyn NearbySearch>,
    answers: CannedAnswers,
    dice: Dice,
    settings: RouterSettings,
}

impl EventRouter {
    pub fn new(
        replies: Arc<dyn ReplySender>,
        places: Arc<dyn NearbySearch>,
        answers: CannedAnswers,
        dice: Dice,
        settings: RouterSettings,
    ) -> Self {
        Self {
            replies,
            places,
            answers,
            dice,
            settings,
        }
    }

    /// Handle events one after another in delivery order. Never fails; failures are counted and logged.
    pub async fn route_batch(&self, events: &[InboundEvent]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for (i, event) in events.iter().enumerate() {
            match self.dispatch(event).await {
                Ok(Outcome::Replied(_)) => summary.replied += 1,
                Ok(Outcome::Silent) => summary.silent += 1,
                Ok(Outcome::Ignored) => summary.ignored += 1,
                Err(e) => {
                    log::warn!("event {} ({}) failed: {}", i, event.kind, e);
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    /// Handle a single event.
    pub async fn dispatch(&self, event: &InboundEvent) -> Result<Outcome, DispatchError> {
        let user = event
            .source
            .as_ref()
            .and_then(|s| s.user_id.as_deref())
            .unwrap_or("-");
        match &event.kind {
            EventType::Message => {}
            EventType::Follow => {
                log::info!("followed by {}", user);
                return Ok(Outcome::Ignored);
            }
            EventType::Unfollow => {
                log::info!("unfollowed by {}", user);
                return Ok(Outcome::Ignored);
            }
            EventType::Join => {
                log::info!("joined a group or room (by {})", user);
                return Ok(Outcome::Ignored);
            }
            EventType::Leave => {
                log::info!("left a group or room");
                return Ok(Outcome::Ignored);
            }
            EventType::Postback => {
                log::info!("postback from {}", user);
                return Ok(Outcome::Ignored);
            }
            EventType::Beacon => {
                log::info!("beacon from {}", user);
                return Ok(Outcome::Ignored);
            }
            EventType::Other(kind) => {
                log::info!("unknown event type: {}", kind);
                return Ok(Outcome::Ignored);
            }
        }

        let Some(message) = &event.message else {
            log::warn!("message event from {} without a message body", user);
            return Ok(Outcome::Ignored);
        };
        match message {
            Message::Text(text) => {
                if !rules::asks_what_to_eat(&text.text) {
                    log::debug!("text from {} matched no rule", user);
                    return Ok(Outcome::Silent);
                }
                let token = reply_token(event)?;
                self.answer_what_to_eat(token).await
            }
            Message::Location(location) => {
                let token = reply_token(event)?;
                self.suggest_nearby_food(token, location).await
            }
            Message::Image(_) | Message::Video(_) | Message::Audio(_) | Message::Sticker(_) => {
                log::debug!("media message from {}; nothing to do", user);
                Ok(Outcome::Ignored)
            }
            Message::Unknown => {
                log::info!("unknown message type from {}", user);
                Ok(Outcome::Ignored)
            }
        }
    }

    async fn answer_what_to_eat(&self, reply_token: &str) -> Result<Outcome, DispatchError> {
        let key = self.dice.roll(CannedAnswers::key_range());
        let answer = self.answers.get(key);
        log::info!("what-to-eat matched, answer #{}: {:?}", key, answer);
        self.send(reply_token, answer).await
    }

    async fn suggest_nearby_food(
        &self,
        reply_token: &str,
        location: &LocationMessage,
    ) -> Result<Outcome, DispatchError> {
        let query = NearbyQuery::open_nearest(
            LatLng {
                lat: location.latitude,
                lng: location.longitude,
            },
            &self.settings.place_type,
            &self.settings.language,
        );
        let places = self.places.nearby(&query).await?;
        log::info!(
            "nearby search at {},{} returned {} place(s)",
            location.latitude,
            location.longitude,
            places.len()
        );
        match self.dice.pick_index(places.len()) {
            Some(i) => {
                let place = &places[i];
                log::debug!(
                    "picked #{}: {} ({}) {}",
                    i,
                    place.name,
                    place.rating,
                    place.formatted_address.as_deref().unwrap_or(&place.vicinity)
                );
                self.send(reply_token, &rules::format_place(place)).await
            }
            None if self.settings.empty_reply.is_empty() => Ok(Outcome::Silent),
            None => self.send(reply_token, &self.settings.empty_reply).await,
        }
    }

    async fn send(&self, reply_token: &str, text: &str) -> Result<Outcome, DispatchError> {
        self.replies.reply_text(reply_token, text).await?;
        Ok(Outcome::Replied(text.to_string()))
    }
}

fn reply_token(event: &InboundEvent) -> Result<&str, DispatchError> {
    event
        .reply_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(DispatchError::MissingReplyToken)
}
