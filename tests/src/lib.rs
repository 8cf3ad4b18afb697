
#[cfg(test)]
mod test_candidate_resources;
#[cfg(test)]
mod test_full_vote_flow;
