/*!
Deferred removal of temporary files.

A [`FileRemoval`] remembers paths that must not outlive the work that created
them, such as staging files for atomic writes. Each observed path is removed
when the caller asks for it, when the tracker is dropped, or when the process
exits normally, whichever happens first. Removal is best effort: a file that is
already gone or cannot be removed never produces an error.

```
use file_removal::FileRemoval;

let dir = tempfile::tempdir().unwrap();
let staging = dir.path().join("output.json.tmp");
std::fs::write(&staging, "{}").unwrap();

let removal = FileRemoval::new();
removal.observe(&staging);
drop(removal);

assert!(!staging.exists());
```
*/

mod removal;
mod shutdown;
mod tracker;

pub use removal::{Removal, remove_path};
pub use tracker::FileRemoval;
