//! HTML rendering of the dashboard page

use crate::error::Result;
use crate::presentation::{View, EXPORT_FILE_NAME, TABLE_HEIGHT_PX};
use crate::session::SessionState;
use minijinja::value::Value;
use minijinja::{context, Environment};
use prophet_forecast::ProphetModel;

const PAGE_TEMPLATE: &str = "index.html";
const TITLE: &str = "Ozone (O3) Level Forecasting Using the Prophet Library";
/// Test-set RMSE reported for the shipped ozone model
const REPORTED_TEST_RMSE: f64 = 17.43;

/// Compiled page template; `.html` names are auto-escaped
#[derive(Debug)]
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(PAGE_TEMPLATE, include_str!("../templates/index.html"))?;
        Ok(Self { env })
    }

    /// Full dashboard page for one session
    pub fn render(
        &self,
        model: &ProphetModel,
        state: &SessionState,
        view: &View,
        error: Option<&str>,
    ) -> Result<String> {
        let (prompt, forecast) = match view {
            View::Prompt(message) => (Some(*message), None),
            View::Forecast(forecast) => {
                // Keep "</script>" inside the payload from closing the tag
                let figure = forecast.chart.to_string().replace("</", "<\\/");
                let section = context! {
                    figure => Value::from_safe_string(figure),
                    horizon => forecast.horizon,
                    table => &forecast.table,
                };
                (None, Some(section))
            }
        };

        let trained_until = model.last_training_date().format("%d/%m/%Y").to_string();
        let template = self.env.get_template(PAGE_TEMPLATE)?;
        let page = template.render(context! {
            title => TITLE,
            trained_until => Value::from_safe_string(trained_until),
            rmse => format!("{:.2}", REPORTED_TEST_RMSE),
            days => state.horizon(),
            error => error,
            prompt => prompt,
            forecast => forecast,
            table_height => TABLE_HEIGHT_PX,
            export_file => EXPORT_FILE_NAME,
        })?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prophet_forecast::load_model;

    const FIXTURE: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../prophet_forecast/tests/fixtures/ozone_model.json"
    );

    #[test]
    fn test_messages_are_escaped() {
        let model = load_model(FIXTURE).unwrap();
        let page = PageRenderer::new()
            .unwrap()
            .render(
                &model,
                &SessionState::new(),
                &View::Prompt("nothing yet"),
                Some("<script>alert(1)</script>"),
            )
            .unwrap();

        assert!(page.contains("&lt;script&gt;alert(1)"));
        assert!(!page.contains("<script>alert(1)"));
        assert!(page.contains("<div class=\"warning\">nothing yet</div>"));
        assert!(page.contains("trained with data up to 05/05/2023"));
    }
}
