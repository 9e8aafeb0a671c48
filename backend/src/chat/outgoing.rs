//! Outgoing messages
//!
//! Turns what the user composed into the stored message (display content and
//! payload) and the prompt the agent actually receives.

use crate::state::{GiftData, LocationData, MessagePayload, TransferData};
use rand::seq::SliceRandom;
use rand::Rng;

/// Text written over the placeholder when a turn fails
pub const FAILURE_TEXT: &str = "Failed to send, please try again.";

/// Note pre-filled in the transfer form
pub const DEFAULT_TRANSFER_NOTE: &str = "Transfer to you";

/// Something the user sends into a conversation
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingMessage {
    /// Typed text
    Text(String),
    /// Money transfer; `amount` as typed in the form
    Transfer {
        /// Amount, must parse as a number
        amount: String,
        /// Free-form note
        note: String,
    },
    /// Sticker from the shelf
    Sticker {
        /// Sticker image reference
        url: String,
    },
    /// Photo, as a data URL
    Image {
        /// Data URL of the photo
        url: String,
    },
    /// Shared location
    Location(LocationData),
    /// Gift
    Gift(GiftData),
    /// Voice call
    Call,
}

/// A validated outgoing message, ready to append and send
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedMessage {
    /// Display text of the user message
    pub content: String,
    /// Stored kind-specific data
    pub payload: MessagePayload,
    /// Text sent to the agent
    pub prompt: String,
    /// Inline image attached to the request
    pub image: Option<String>,
}

impl OutgoingMessage {
    /// Validate and translate into a [`ComposedMessage`]
    ///
    /// Returns `None` for blank text and for transfers whose amount is not
    /// a number; those sends are dropped without a trace.
    pub fn compose(self) -> Option<ComposedMessage> {
        let composed = match self {
            OutgoingMessage::Text(text) => {
                if text.trim().is_empty() {
                    return None;
                }
                ComposedMessage {
                    prompt: text.clone(),
                    content: text,
                    payload: MessagePayload::Text,
                    image: None,
                }
            }
            OutgoingMessage::Transfer { amount, note } => {
                let amount = amount.trim().to_string();
                if amount.parse::<f64>().map_or(true, |a| !a.is_finite()) {
                    return None;
                }
                ComposedMessage {
                    content: format!("Transfer ¥{}", amount),
                    prompt: transfer_prompt(&amount, &note),
                    payload: MessagePayload::Transfer(TransferData {
                        amount,
                        note,
                        is_received: false,
                    }),
                    image: None,
                }
            }
            OutgoingMessage::Sticker { url } => ComposedMessage {
                content: "Sent a sticker".to_string(),
                prompt: "Sent a sticker".to_string(),
                payload: MessagePayload::Sticker { url },
                image: None,
            },
            OutgoingMessage::Image { url } => ComposedMessage {
                content: "Sent a photo".to_string(),
                prompt: "Sent a photo".to_string(),
                image: Some(url.clone()),
                payload: MessagePayload::Image { url },
            },
            OutgoingMessage::Location(location) => ComposedMessage {
                content: format!("[Location] {}", location.address),
                prompt: format!("I shared my location: {}.", location.address),
                payload: MessagePayload::Location(location),
                image: None,
            },
            OutgoingMessage::Gift(gift) => ComposedMessage {
                content: format!("[Gift] {}", gift.item),
                prompt: format!("I sent you a gift: {}.", gift.item),
                payload: MessagePayload::Gift(gift),
                image: None,
            },
            OutgoingMessage::Call => ComposedMessage {
                content: "Voice call".to_string(),
                prompt: "I just placed a voice call to you.".to_string(),
                payload: MessagePayload::Call,
                image: None,
            },
        };
        Some(composed)
    }
}

fn transfer_prompt(amount: &str, note: &str) -> String {
    format!(
        "I just transferred ¥{} to you with the note: {}. Please accept it.",
        amount, note
    )
}

/// The location the "share location" action sends
pub fn sample_location() -> LocationData {
    LocationData {
        address: "Taipei 101, Xinyi District, Taipei".to_string(),
        lat: 25.0339,
        lng: 121.5644,
    }
}

/// Gifts the "send gift" action picks from
pub fn gift_catalog() -> Vec<GiftData> {
    [
        ("Coffee voucher", "☕"),
        ("Movie ticket", "🎟️"),
        ("Birthday cake", "🎂"),
        ("Red envelope", "🧧"),
    ]
    .into_iter()
    .map(|(item, image)| GiftData {
        item: item.to_string(),
        image: image.to_string(),
    })
    .collect()
}

/// Pick a gift from the catalog
pub fn pick_gift<R: Rng + ?Sized>(rng: &mut R) -> Option<GiftData> {
    gift_catalog().choose(rng).cloned()
}

/// Pick a gift with the thread-local generator
pub fn random_gift() -> Option<GiftData> {
    pick_gift(&mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_blank_text_is_dropped() {
        assert!(OutgoingMessage::Text("   ".into()).compose().is_none());
        assert!(OutgoingMessage::Text(String::new()).compose().is_none());
    }

    #[test]
    fn test_text_prompt_is_the_content() {
        let composed = OutgoingMessage::Text("hello".into()).compose().unwrap();
        assert_eq!(composed.content, "hello");
        assert_eq!(composed.prompt, "hello");
        assert_eq!(composed.payload, MessagePayload::Text);
        assert!(composed.image.is_none());
    }

    #[test]
    fn test_transfer_prompt() {
        let composed = OutgoingMessage::Transfer {
            amount: "50".into(),
            note: "lunch".into(),
        }
        .compose()
        .unwrap();
        assert_eq!(
            composed.prompt,
            "I just transferred ¥50 to you with the note: lunch. Please accept it."
        );
        assert_eq!(composed.content, "Transfer ¥50");
        assert_eq!(
            composed.payload,
            MessagePayload::Transfer(TransferData {
                amount: "50".into(),
                note: "lunch".into(),
                is_received: false,
            })
        );
    }

    #[test]
    fn test_transfer_amount_must_be_numeric() {
        for amount in ["", "abc", "12x", "NaN"] {
            let message = OutgoingMessage::Transfer {
                amount: amount.into(),
                note: "n".into(),
            };
            assert!(message.compose().is_none(), "amount {:?}", amount);
        }
        assert!(OutgoingMessage::Transfer {
            amount: "12.5".into(),
            note: String::new(),
        }
        .compose()
        .is_some());
    }

    #[test]
    fn test_synthetic_prompts() {
        let location = OutgoingMessage::Location(sample_location()).compose().unwrap();
        assert_eq!(
            location.prompt,
            "I shared my location: Taipei 101, Xinyi District, Taipei."
        );

        let gift = OutgoingMessage::Gift(GiftData {
            item: "Movie ticket".into(),
            image: "🎟️".into(),
        })
        .compose()
        .unwrap();
        assert_eq!(gift.prompt, "I sent you a gift: Movie ticket.");
        assert_eq!(gift.content, "[Gift] Movie ticket");

        let call = OutgoingMessage::Call.compose().unwrap();
        assert_eq!(call.prompt, "I just placed a voice call to you.");
        assert_eq!(call.payload, MessagePayload::Call);
    }

    #[test]
    fn test_image_attaches_data_url() {
        let composed = OutgoingMessage::Image {
            url: "data:image/png;base64,AAAA".into(),
        }
        .compose()
        .unwrap();
        assert_eq!(composed.image.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(composed.prompt, composed.content);
    }

    #[test]
    fn test_pick_gift_comes_from_catalog() {
        let catalog = gift_catalog();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let gift = pick_gift(&mut rng).unwrap();
            assert!(catalog.contains(&gift));
        }
        assert!(catalog.contains(&random_gift().unwrap()));
    }

    #[test]
    fn test_pick_gift_is_reproducible_with_a_seed() {
        let first = pick_gift(&mut StdRng::seed_from_u64(42));
        let second = pick_gift(&mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }
}
