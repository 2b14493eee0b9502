//! User-facing message texts. Russian only.

use crate::model::WeatherReport;

pub const GREETING: &str = "Привет! Напиши мне название города, и я пришлю сводку погоды.";
pub const EMPTY_QUERY: &str = "Напиши название города, например: Москва.";
pub const GENERIC_FAILURE: &str =
    "Не удалось получить данные о погоде. Попробуй ещё раз немного позже.";

pub fn render_report(report: &WeatherReport) -> String {
    format!(
        "\u{1F3D9} Погода в {kind} {location} ({country}):\n\
         \u{1F321} Температура: {temp}°C\n\
         \u{2601} {description}\n\
         \u{1F4A7} Влажность: {humidity}%\n\
         \u{1F32C} Ветер: {wind} м/с",
        kind = report.kind.locative(),
        location = report.location,
        country = report.country,
        temp = report.temperature_c,
        description = report.description,
        humidity = report.humidity_pct,
        wind = report.wind_speed_mps,
    )
}

pub fn suggestions_prompt(location: &str) -> String {
    format!("Не удалось найти погоду для '{location}'. Возможно, вы имели в виду:")
}

pub fn no_matches(location: &str) -> String {
    format!("Не удалось найти город '{location}'. Проверьте название и попробуйте ещё раз.")
}
