// File: holodeck-core/src/services/discord/slashcommands/add_scene.rs

use std::sync::Arc;

use twilight_http::Client as HttpClient;
use twilight_model::{
    application::command::CommandType,
    application::interaction::Interaction,
    application::interaction::application_command::{CommandData, CommandOptionValue},
    http::interaction::{InteractionResponse, InteractionResponseType},
    id::Id,
    id::marker::ApplicationMarker,
};
use twilight_util::builder::command::{BooleanBuilder, CommandBuilder, NumberBuilder, StringBuilder};

use holodeck_common::error::Error;

use crate::services::{RegisterScene, Services};
use crate::services::discord::slashcommands::{respond_ephemeral, user_facing_message};

/// Create a CommandBuilder for `/add_scene`.
pub fn create_add_scene_command() -> CommandBuilder {
    CommandBuilder::new(
        "add_scene",
        "Create a new scene you can banish people into.",
        CommandType::ChatInput,
    )
    .option(StringBuilder::new("name", "The name of your scene.").required(true))
    .option(StringBuilder::new("youtube_url", "The audio for your scene.").required(true))
    .option(StringBuilder::new("image_url", "The image to accompany your scene.").required(true))
    .option(
        NumberBuilder::new(
            "runtime_seconds",
            "How long the scene should last (default 10).",
        )
        .min_value(0.0),
    )
    .option(
        NumberBuilder::new(
            "start_time_seconds",
            "The start time you want for your audio (default 0).",
        )
        .min_value(0.0),
    )
    .option(BooleanBuilder::new(
        "overwrite",
        "Set this true if you're overwriting an existing scene.",
    ))
}

/// Handle an incoming `/add_scene` interaction. The media download can
/// take a while, so the response is deferred and edited afterwards.
pub async fn handle_add_scene(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    services: &Arc<Services>,
    interaction: &Interaction,
    data: &CommandData,
) -> Result<(), Error> {
    let mut name = None;
    let mut youtube_url = None;
    let mut image_url = None;
    let mut runtime_seconds = 10.0;
    let mut start_time_seconds = 0.0;
    let mut overwrite = false;

    for opt in &data.options {
        match (opt.name.as_str(), &opt.value) {
            ("name", CommandOptionValue::String(v)) => name = Some(v.clone()),
            ("youtube_url", CommandOptionValue::String(v)) => youtube_url = Some(v.clone()),
            ("image_url", CommandOptionValue::String(v)) => image_url = Some(v.clone()),
            ("runtime_seconds", CommandOptionValue::Number(v)) => runtime_seconds = *v,
            ("start_time_seconds", CommandOptionValue::Number(v)) => start_time_seconds = *v,
            ("overwrite", CommandOptionValue::Boolean(v)) => overwrite = *v,
            _ => {}
        }
    }

    let (Some(name), Some(youtube_url), Some(image_url)) = (name, youtube_url, image_url) else {
        return Err(Error::Platform(
            "add_scene interaction missing required options".into(),
        ));
    };

    // Duplicate names are answerable without the download; everything
    // past this point is slow, so defer first. The service re-checks
    // under the same (accepted) race.
    if services.store.contains(&name) && !overwrite {
        let msg = user_facing_message(&Error::SceneExists(name)).unwrap_or_default();
        return respond_ephemeral(http, application_id, interaction, msg).await;
    }

    http.interaction(application_id)
        .create_response(
            interaction.id,
            &interaction.token,
            &InteractionResponse {
                kind: InteractionResponseType::DeferredChannelMessageWithSource,
                data: None,
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error deferring `/add_scene`: {e}")))?;

    let creator_user_id = interaction
        .author_id()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let result = services
        .scenes
        .register(RegisterScene {
            name: name.clone(),
            creator_user_id,
            youtube_url,
            image_url,
            runtime_seconds,
            start_time_seconds,
            overwrite,
        })
        .await;

    let content = match result {
        Ok(scene) => format!("Created the scene `{}`.", scene.name),
        Err(e) => match user_facing_message(&e) {
            Some(msg) => msg,
            None => return Err(e),
        },
    };

    http.interaction(application_id)
        .update_response(&interaction.token)
        .content(Some(&content))
        .await
        .map_err(|e| Error::Platform(format!("Error editing `/add_scene` response: {e}")))?;

    Ok(())
}
