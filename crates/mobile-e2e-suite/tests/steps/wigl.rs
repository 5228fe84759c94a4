//! Wigl home screen, language and login

use cucumber::{given, then, when};
use mobile_e2e_suite::Language;
use tracing::info;

use super::world::E2eWorld;

#[given(regex = r"^l'application Wigl est (?:lancée|ouverte)$")]
async fn wigl_is_launched(world: &mut E2eWorld) {
    assert!(world.session.is_some(), "Le driver devrait être initialisé");
}

#[then(regex = r"^l'utilisateur devrait voir les éléments de la page d'accueil$")]
async fn user_sees_home(world: &mut E2eWorld) {
    let page = world.login_page();
    assert!(page.wait_for_home().await, "La page d'accueil devrait être affichée");
    assert!(page.is_home_displayed().await);
}

#[then(regex = r"^l'utilisateur voit les options de langue$")]
async fn user_sees_language_options(world: &mut E2eWorld) {
    let page = world.login_page();
    page.reveal_language_options()
        .await
        .expect("Le texte devrait remonter");
    assert!(
        page.are_language_options_displayed().await,
        "Les options de langue devraient être visibles"
    );
}

#[when(regex = r#"^l'utilisateur sélectionne "([^"]*)"$"#)]
async fn user_selects_language(world: &mut E2eWorld, language: String) {
    let language: Language = language.parse().expect("langue connue");
    world
        .login_page()
        .select_language(language)
        .await
        .expect("La langue devrait être sélectionnée");
}

#[then(regex = r"^l'application devrait être en français$")]
async fn app_is_french(world: &mut E2eWorld) {
    assert!(
        world.login_page().is_language_french().await,
        "L'application devrait être en français"
    );
}

#[when(regex = r#"^user enters email "([^"]*)" and password "([^"]*)"$"#)]
async fn user_logs_in(world: &mut E2eWorld, email: String, password: String) {
    world
        .login_page()
        .login(&email, &password)
        .await
        .expect("login should succeed");
}

#[when(regex = r"^user taps on the login button$")]
async fn user_taps_login(world: &mut E2eWorld) {
    // submitted as the last step of the login flow
    assert!(
        world.login_page().wait_for_balances().await,
        "Home balances should show once the login is submitted"
    );
    info!("Login button tapped");
}

#[then(regex = r"^user should see the home page$")]
async fn user_sees_home_page(world: &mut E2eWorld) {
    let page = world.login_page();
    assert!(page.cashback_value().await.is_some(), "Cashback amount should be visible");
    assert!(page.crypto_balance_value().await.is_some(), "Crypto balance should be visible");
}

#[then(regex = r"^user should see their cashback amount$")]
async fn user_sees_cashback(world: &mut E2eWorld) {
    let cashback = world.login_page().cashback_value().await;
    assert!(cashback.is_some(), "Cashback amount should not be empty");
    info!("Cashback amount displayed: {:?}", cashback);
}

#[then(regex = r"^user should see their crypto balance$")]
async fn user_sees_crypto(world: &mut E2eWorld) {
    let balance = world.login_page().crypto_balance_value().await;
    assert!(balance.is_some(), "Crypto balance should not be empty");
    info!("Crypto balance displayed: {:?}", balance);
}
