use google_sheets4::api::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, GridProperties, Request, Scope,
    SheetProperties, ValueRange,
};
use google_sheets4::hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use google_sheets4::hyper_util::client::legacy::connect::HttpConnector;
use google_sheets4::hyper_util::client::legacy::Client;
use google_sheets4::hyper_util::rt::TokioExecutor;
use google_sheets4::{yup_oauth2, Sheets};
use tokio::runtime::Runtime;
use tracing::info;

use super::{SheetError, SheetGateway};
use crate::config::SheetCredentials;

const NEW_TAB_ROWS: i32 = 2000;
const NEW_TAB_COLUMNS: i32 = 50;

/// Wrapper around the generated google-sheets4 client so the synchronous
/// generator can append blocks without exposing async details.
pub struct GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    hub: Sheets<C>,
    runtime: Runtime,
    spreadsheet_id: String,
}

impl<C> GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    pub fn new(hub: Sheets<C>, runtime: Runtime, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            hub,
            runtime,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    fn map_error<E: std::fmt::Display>(err: E) -> SheetError {
        SheetError::Backend(err.to_string())
    }

    fn ensure_tab(&self, tab: &str) -> Result<(), SheetError> {
        let result = self.runtime.block_on(async {
            self.hub
                .spreadsheets()
                .get(&self.spreadsheet_id)
                .param("fields", "sheets.properties.title")
                .add_scope(Scope::Spreadsheet)
                .doit()
                .await
        });
        let (_, spreadsheet) = result.map_err(Self::map_error)?;

        let exists = spreadsheet
            .sheets
            .unwrap_or_default()
            .iter()
            .filter_map(|sheet| sheet.properties.as_ref())
            .any(|properties| properties.title.as_deref() == Some(tab));
        if exists {
            return Ok(());
        }

        let request = BatchUpdateSpreadsheetRequest {
            requests: Some(vec![Request {
                add_sheet: Some(AddSheetRequest {
                    properties: Some(SheetProperties {
                        title: Some(tab.to_string()),
                        grid_properties: Some(GridProperties {
                            row_count: Some(NEW_TAB_ROWS),
                            column_count: Some(NEW_TAB_COLUMNS),
                            ..GridProperties::default()
                        }),
                        ..SheetProperties::default()
                    }),
                }),
                ..Request::default()
            }]),
            ..BatchUpdateSpreadsheetRequest::default()
        };

        let result = self.runtime.block_on(async {
            self.hub
                .spreadsheets()
                .batch_update(request, &self.spreadsheet_id)
                .add_scope(Scope::Spreadsheet)
                .doit()
                .await
        });
        result.map_err(Self::map_error)?;
        info!(tab, "created sheet tab");
        Ok(())
    }
}

impl GoogleSheetsClient<HttpsConnector<HttpConnector>> {
    /// Authenticates with a service account key and opens the spreadsheet.
    pub fn from_service_account(credentials: &SheetCredentials) -> Result<Self, SheetError> {
        let runtime = Runtime::new().map_err(|err| SheetError::Runtime(err.to_string()))?;
        let key = yup_oauth2::parse_service_account_key(&credentials.service_account_json)
            .map_err(|err| SheetError::Credentials(err.to_string()))?;

        let auth = runtime
            .block_on(yup_oauth2::ServiceAccountAuthenticator::builder(key).build())
            .map_err(|err| SheetError::Credentials(err.to_string()))?;

        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|err| SheetError::Runtime(err.to_string()))?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);
        let hub = Sheets::new(client, auth);

        Ok(Self::new(hub, runtime, credentials.spreadsheet_id.clone()))
    }
}

impl<C> std::fmt::Debug for GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsClient")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .finish_non_exhaustive()
    }
}

impl<C> SheetGateway for GoogleSheetsClient<C>
where
    C: google_sheets4::common::Connector + Send + Sync + 'static,
{
    fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> Result<(), SheetError> {
        self.ensure_tab(tab)?;

        let values = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| serde_json::Value::String(cell.clone()))
                    .collect()
            })
            .collect();
        let body = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            values: Some(values),
            ..ValueRange::default()
        };
        let range = format!("'{}'!A:A", tab.replace('\'', "''"));

        let result = self.runtime.block_on(async {
            self.hub
                .spreadsheets()
                .values_append(body, &self.spreadsheet_id, &range)
                .value_input_option("USER_ENTERED")
                .add_scope(Scope::Spreadsheet)
                .doit()
                .await
        });
        result.map_err(Self::map_error)?;
        Ok(())
    }
}
