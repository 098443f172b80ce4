mod test_peer_joined_goes_to_earlier_member;
mod test_room_full_rejects_join;
