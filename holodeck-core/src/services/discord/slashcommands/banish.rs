// File: holodeck-core/src/services/discord/slashcommands/banish.rs

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client as HttpClient;
use twilight_model::{
    application::command::{CommandOptionChoice, CommandOptionChoiceValue, CommandType},
    application::interaction::Interaction,
    application::interaction::application_command::{CommandData, CommandOptionValue},
    channel::ChannelType,
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    id::Id,
    id::marker::{ApplicationMarker, InteractionMarker, UserMarker},
};
use twilight_util::builder::command::{CommandBuilder, StringBuilder, UserBuilder};
use twilight_util::builder::embed::{EmbedBuilder, ImageSource};

use holodeck_common::error::Error;
use holodeck_common::models::Scene;
use holodeck_common::traits::platform_traits::BanishAnnouncer;

use crate::services::{BanishRequest, Services};
use crate::services::discord::slashcommands::{respond_ephemeral, user_facing_message};

/// Create a CommandBuilder for `/banish`.
pub fn create_banish_command() -> CommandBuilder {
    CommandBuilder::new(
        "banish",
        "Banish someone to a scene of your choosing.",
        CommandType::ChatInput,
    )
    .option(UserBuilder::new("who", "The person you would like to banish.").required(true))
    .option(
        StringBuilder::new("where", "Where you want to send them.")
            .required(true)
            .autocomplete(true),
    )
}

/// Handle an incoming `/banish` interaction.
pub async fn handle_banish(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    cache: &Arc<InMemoryCache>,
    services: &Arc<Services>,
    interaction: &Interaction,
    data: &CommandData,
) -> Result<(), Error> {
    let mut who = None;
    let mut where_name = None;
    for opt in &data.options {
        match (opt.name.as_str(), &opt.value) {
            ("who", CommandOptionValue::User(id)) => who = Some(*id),
            ("where", CommandOptionValue::String(v)) => where_name = Some(v.clone()),
            _ => {}
        }
    }
    let (Some(target_id), Some(scene_name)) = (who, where_name) else {
        return Err(Error::Platform(
            "banish interaction missing required options".into(),
        ));
    };
    let Some(guild_id) = interaction.guild_id else {
        return respond_ephemeral(
            http,
            application_id,
            interaction,
            "Banishment only works inside a guild.".to_string(),
        )
        .await;
    };

    // The configured destination has to resolve to an actual voice
    // channel before anyone gets moved.
    let dest_id = services.banish_channel_id;
    let dest_is_voice = cache
        .channel(dest_id)
        .map(|c| c.kind == ChannelType::GuildVoice)
        .unwrap_or(false);
    if !dest_is_voice {
        return respond_ephemeral(
            http,
            application_id,
            interaction,
            format!("Failed to find a voice channel with id: {dest_id}"),
        )
        .await;
    }

    let announcer = InteractionAnnouncer {
        http: Arc::clone(http),
        application_id,
        interaction_id: interaction.id,
        token: interaction.token.clone(),
    };
    let request = BanishRequest {
        guild_id,
        target_id,
        scene_name,
        dest_channel_id: dest_id,
    };

    match services.banish.banish(request, &announcer).await {
        Ok(()) => Ok(()),
        Err(e) => match user_facing_message(&e) {
            Some(msg) => respond_ephemeral(http, application_id, interaction, msg).await,
            None => Err(e),
        },
    }
}

/// Answers the `/banish` interaction with the scene embed. Runs as
/// playback starts, while the orchestrator still holds the lock.
struct InteractionAnnouncer {
    http: Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    interaction_id: Id<InteractionMarker>,
    token: String,
}

#[async_trait]
impl BanishAnnouncer for InteractionAnnouncer {
    async fn announce(&self, scene: &Scene, target_id: Id<UserMarker>) -> Result<(), Error> {
        let mut embed = EmbedBuilder::new().title("Begone!").description(format!(
            "<@{target_id}> you have been banished to `{}`",
            scene.name
        ));
        match ImageSource::url(&scene.image_url) {
            Ok(image) => embed = embed.image(image),
            Err(e) => warn!("Scene `{}` has an unusable image URL: {e}", scene.name),
        }

        self.http
            .interaction(self.application_id)
            .create_response(
                self.interaction_id,
                &self.token,
                &InteractionResponse {
                    kind: InteractionResponseType::ChannelMessageWithSource,
                    data: Some(InteractionResponseData {
                        embeds: Some(vec![embed.build()]),
                        ..Default::default()
                    }),
                },
            )
            .await
            .map_err(|e| Error::Platform(format!("Error sending banish announcement: {e}")))?;
        Ok(())
    }
}

/// Case-insensitive substring match over the committed scene names,
/// alphabetical, capped at Discord's 25-choice limit.
pub(crate) fn filter_scene_choices(mut names: Vec<String>, partial: &str) -> Vec<String> {
    let needle = partial.to_lowercase();
    names.retain(|n| n.to_lowercase().contains(&needle));
    names.sort();
    names.truncate(25);
    names
}

/// Answer an autocomplete query for the `where` option.
pub async fn handle_banish_autocomplete(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
    services: &Arc<Services>,
    interaction: &Interaction,
    data: &CommandData,
) -> Result<(), Error> {
    let partial = data
        .options
        .iter()
        .find_map(|opt| match (opt.name.as_str(), &opt.value) {
            ("where", CommandOptionValue::Focused(v, _)) => Some(v.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let choices = filter_scene_choices(services.store.names(), &partial)
        .into_iter()
        .map(|name| CommandOptionChoice {
            name: name.clone(),
            name_localizations: None,
            value: CommandOptionChoiceValue::String(name),
        })
        .collect::<Vec<_>>();

    http.interaction(application_id)
        .create_response(
            interaction.id,
            &interaction.token,
            &InteractionResponse {
                kind: InteractionResponseType::ApplicationCommandAutocompleteResult,
                data: Some(InteractionResponseData {
                    choices: Some(choices),
                    ..Default::default()
                }),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error sending autocomplete choices: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::filter_scene_choices;

    #[test]
    fn matches_case_insensitive_substrings_and_sorts() {
        let names = vec![
            "volcano".to_string(),
            "deep cave".to_string(),
            "Cave".to_string(),
        ];
        assert_eq!(
            filter_scene_choices(names, "CAV"),
            vec!["Cave".to_string(), "deep cave".to_string()]
        );
    }

    #[test]
    fn empty_query_lists_everything_sorted() {
        let names = vec!["b".to_string(), "a".to_string()];
        assert_eq!(
            filter_scene_choices(names, ""),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn caps_at_the_platform_choice_limit() {
        let names = (0..40).map(|i| format!("scene-{i:02}")).collect();
        assert_eq!(filter_scene_choices(names, "scene").len(), 25);
    }
}
