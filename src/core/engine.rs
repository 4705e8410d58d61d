use crate::core::connection;
use crate::core::loader::{self, LoadOptions};
use crate::core::updater::BatchUpdater;
use crate::domain::model::{BatchReport, ConnectionParams};
use crate::domain::ports::Company;
use crate::utils::error::{Result, UpdaterError};
use std::io::Write;
use std::path::PathBuf;

/// Runs one batch: connect, load the CSV, update every item, disconnect.
pub struct UpdateEngine<C: Company> {
    company: C,
    params: ConnectionParams,
    csv_path: PathBuf,
    load_options: LoadOptions,
    updater: BatchUpdater,
}

impl<C: Company> UpdateEngine<C> {
    pub fn new(
        company: C,
        params: ConnectionParams,
        csv_path: impl Into<PathBuf>,
        load_options: LoadOptions,
        updater: BatchUpdater,
    ) -> Self {
        Self {
            company,
            params,
            csv_path: csv_path.into(),
            load_options,
            updater,
        }
    }

    /// Once the session is open it is closed on every path out of here,
    /// and the first error is returned after that.
    pub async fn run<W: Write + Send>(&mut self, out: &mut W) -> Result<BatchReport> {
        writeln!(out, "Connecting to {}...", self.params.server)?;

        let connected = connection::connect(&mut self.company, &self.params).await;
        let outcome = match connected {
            Ok(true) => self.process(out).await,
            Ok(false) => Err(UpdaterError::ConnectionFailed {
                server: self.params.server.clone(),
                reason: self.company.last_error_description(),
            }),
            Err(e) => Err(e),
        };

        let released = self.release(out).await;
        let report = outcome?;
        released?;
        Ok(report)
    }

    async fn process<W: Write + Send>(&mut self, out: &mut W) -> Result<BatchReport> {
        let items = loader::load_items(&self.csv_path, self.load_options)?;

        writeln!(out, "Processing [{}] items...", items.len())?;
        out.flush()?;

        self.updater.run(&self.company, &items, out).await
    }

    async fn release<W: Write + Send>(&mut self, out: &mut W) -> Result<()> {
        let announced = writeln!(out, "\nDisconnecting now...");
        connection::disconnect(&mut self.company).await;
        tracing::info!("Disconnected from {}", self.params.server);

        announced?;
        writeln!(out, "\nDisconnected.")?;
        out.flush()?;
        Ok(())
    }

    pub fn company(&self) -> &C {
        &self.company
    }
}
