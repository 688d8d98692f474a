mod diagnostics;
mod loading;
mod logging;
mod schema;
