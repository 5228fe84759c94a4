//! Lydia help form

use cucumber::{given, then, when};
use mobile_e2e_core::UiElement;

use super::world::E2eWorld;

#[given(regex = r"^l'application Lydia est lancée$")]
async fn lydia_is_launched(world: &mut E2eWorld) {
    let page = world.login_page();
    let help = page
        .profile()
        .locator(UiElement::HelpButton, page.base().platform())
        .expect("Lydia profile has a help button");
    page.base()
        .wait_clickable(&help)
        .await
        .expect("Le bouton d'aide devrait être cliquable");
}

#[when(regex = r#"^l'utilisateur clique sur "([^"]*)"$"#)]
async fn user_clicks(world: &mut E2eWorld, button: String) {
    let page = world.login_page();
    let result = match button.as_str() {
        "Besoin d'aide" => page.open_help().await,
        "Un problème pour vous connecter" => page.open_connection_problem().await,
        other => panic!("Bouton non reconnu : {other}"),
    };
    result.expect("Le clic devrait réussir");
}

#[when(regex = r#"^l'utilisateur saisit le numéro "([^"]*)"$"#)]
async fn user_enters_phone(world: &mut E2eWorld, phone: String) {
    world
        .login_page()
        .enter_phone(&phone)
        .await
        .expect("Le numéro devrait être saisi");
}

#[when(regex = r#"^l'utilisateur saisit l'email "([^"]*)"$"#)]
async fn user_enters_email(world: &mut E2eWorld, email: String) {
    world
        .login_page()
        .enter_help_email(&email)
        .await
        .expect("L'email devrait être saisi");
}

#[then(regex = r"^l'utilisateur envoie la demande d'aide$")]
async fn user_sends_request(world: &mut E2eWorld) {
    world
        .login_page()
        .send_help_request()
        .await
        .expect("La demande d'aide devrait être envoyée");
}
