use train::entry;
use train::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
