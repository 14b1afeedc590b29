use edgeprobe::error::AppResult;

fn main() -> AppResult<()> {
    edgeprobe::entry::run()
}
