use crate::bot::interactions::invoice_buttons;
use crate::bot::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!("Bot logged in as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component_interaction),
        } => {
            if invoice_buttons::is_invoice_action(&component_interaction.data.custom_id) {
                if let Err(e) =
                    invoice_buttons::handle_invoice_interaction(ctx, component_interaction, data)
                        .await
                {
                    tracing::error!("Error handling component interaction: {:?}", e);
                }
            }
        }
        _ => {}
    }
    Ok(())
}
