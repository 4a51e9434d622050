// Master/worker root distribution over worker processes of this same binary.
// The master owns the root and the UCI conversation; workers serve search
// requests for one child position at a time over their stdio pipes.
pub mod master;
pub mod protocol;
pub mod worker;
