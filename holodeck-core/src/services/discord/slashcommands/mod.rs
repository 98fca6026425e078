// File: holodeck-core/src/services/discord/slashcommands/mod.rs

pub mod add_scene;
pub mod banish;

use std::sync::Arc;

use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client as HttpClient;
use twilight_model::{
    application::interaction::{Interaction, InteractionData, InteractionType},
    channel::message::MessageFlags,
    gateway::payload::incoming::InteractionCreate,
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    id::Id,
    id::marker::ApplicationMarker,
};

use holodeck_common::error::Error;

use crate::services::Services;
use crate::services::discord::slashcommands::add_scene::{
    create_add_scene_command, handle_add_scene,
};
use crate::services::discord::slashcommands::banish::{
    create_banish_command, handle_banish, handle_banish_autocomplete,
};

pub async fn register_global_slash_commands(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
) -> Result<(), Error> {
    let add_scene_cmd = create_add_scene_command().build();
    let banish_cmd = create_banish_command().build();
    let commands = &[add_scene_cmd, banish_cmd];

    http.interaction(application_id)
        .set_global_commands(commands)
        .await
        .map_err(|e| Error::Platform(format!("Failed to register global slash commands: {e}")))?;

    Ok(())
}

/// Dispatch slash commands and autocomplete queries from an
/// `InteractionCreate`.
pub async fn handle_interaction_create(
    http: Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    cache: Arc<InMemoryCache>,
    services: Arc<Services>,
    event: &InteractionCreate,
) -> Result<(), Error> {
    let interaction = &event.0;

    let Some(InteractionData::ApplicationCommand(cmd_data)) = &interaction.data else {
        return Ok(());
    };

    if interaction.kind == InteractionType::ApplicationCommandAutocomplete {
        if cmd_data.name == "banish" {
            handle_banish_autocomplete(&http, application_id, &services, interaction, cmd_data)
                .await?;
        }
        return Ok(());
    }

    match cmd_data.name.as_str() {
        "add_scene" => {
            handle_add_scene(&http, application_id, &services, interaction, cmd_data).await
        }
        "banish" => {
            handle_banish(&http, application_id, &cache, &services, interaction, cmd_data).await
        }
        other => {
            // For unknown commands, respond with error:
            http.interaction(application_id)
                .create_response(
                    interaction.id,
                    &interaction.token,
                    &InteractionResponse {
                        kind: InteractionResponseType::ChannelMessageWithSource,
                        data: Some(InteractionResponseData {
                            content: Some(format!("Unrecognized command: {other}")),
                            ..Default::default()
                        }),
                    },
                )
                .await
                .ok(); // ignore error
            Ok(())
        }
    }
}

/// Message for an error the invoking user can act on. `None` means the
/// error is not theirs to see and should propagate to the dispatch log.
pub(crate) fn user_facing_message(err: &Error) -> Option<String> {
    match err {
        Error::SceneExists(name) => Some(format!(
            "A scene with the name {name} already exists. If you want to overwrite it, \
             please provide the `overwrite=True` option."
        )),
        Error::UnknownScene(name) => Some(format!("I have no record of a scene called {name}.")),
        Error::NotInVoice(user_id) => {
            Some(format!("User <@{user_id}> is not in a voice channel."))
        }
        Error::MediaNotFound(url) => Some(format!(
            "Failed to download the audio. Are you sure this is the right URL? `{url}`"
        )),
        Error::StartBeyondClip {
            start_millis,
            duration_millis,
        } => Some(format!(
            "The requested start time ({}s) is past the end of the clip ({}s).",
            *start_millis as f64 / 1000.0,
            *duration_millis as f64 / 1000.0
        )),
        Error::Busy => Some("The bot is busy at the moment. Please try again later.".to_string()),
        _ => None,
    }
}

pub(crate) async fn respond_ephemeral(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    interaction: &Interaction,
    content: String,
) -> Result<(), Error> {
    http.interaction(application_id)
        .create_response(
            interaction.id,
            &interaction.token,
            &InteractionResponse {
                kind: InteractionResponseType::ChannelMessageWithSource,
                data: Some(InteractionResponseData {
                    content: Some(content),
                    flags: Some(MessageFlags::EPHEMERAL),
                    ..Default::default()
                }),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error sending interaction response: {e}")))?;
    Ok(())
}
