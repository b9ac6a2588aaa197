//! WhatsApp Integration - Cloud API webhook interface
//!
//! This crate provides the WhatsApp interface for TIA:
//! - **Webhook** (`webhook`) - verification handshake plus inbound message
//!   decoding for the Graph API notification envelope
//! - **Client** (`client`) - outbound sends: text, image (with media upload),
//!   and read receipts
//!
//! # Getting Started
//!
//! 1. Create a Meta app with the WhatsApp product attached
//! 2. Point the webhook at `/webhook` and set the verify token
//! 3. Set env vars: `TIA_WHATSAPP_ACCESS_TOKEN`, `TIA_WHATSAPP_VERIFY_TOKEN`,
//!    `TIA_WHATSAPP_PHONE_NUMBER_ID`
//!
//! ```text
//! WhatsApp Cloud API → webhook router → Agent Runtime → Catalog Store
//!                           ↓
//!                   WhatsAppClient ← replies / artifacts
//! ```

pub mod client;
pub mod webhook;

pub use client::{TransportError, WhatsAppClient};
pub use webhook::{router, InboundText, VerifyError, WebhookState};
